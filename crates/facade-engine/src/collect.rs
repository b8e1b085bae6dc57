//! Collection of build outputs and cleanup of the working directory.

use std::path::{Path, PathBuf};

use facade_util::error::UtilError;
use facade_util::fs::{copy_replacing, ensure_dir, remove_tree};
use facade_util::hash::sha256_file;

use crate::error::EngineError;

/// Name of the descriptor copy in the output directory.
pub const DESCRIPTOR_NAME: &str = "pom.xml";

/// A file placed in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    pub path: PathBuf,
    pub sha256: String,
}

/// Copy every `target/*.jar` of `work_dir` and the descriptor into `output_dir`.
///
/// Existing files of the same name are replaced, so repeated runs with the
/// same inputs leave identical bytes behind.
///
/// # Errors
/// Returns an error if the output directory cannot be created or a file
/// cannot be copied or hashed.
pub fn collect_outputs(
    work_dir: &Path,
    descriptor: &Path,
    output_dir: &Path,
) -> Result<Vec<CollectedFile>, EngineError> {
    ensure_dir(output_dir)?;

    let target = work_dir.join("target");
    let pattern = format!(
        "{}/*.jar",
        glob::Pattern::escape(&target.display().to_string())
    );
    let mut jars: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| UtilError::GlobPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    jars.sort();

    let mut collected = Vec::with_capacity(jars.len() + 1);
    for jar in jars {
        let Some(name) = jar.file_name() else {
            continue;
        };
        let dest = output_dir.join(name);
        collected.push(copy_one(&jar, &dest)?);
    }
    collected.push(copy_one(descriptor, &output_dir.join(DESCRIPTOR_NAME))?);

    Ok(collected)
}

fn copy_one(src: &Path, dest: &Path) -> Result<CollectedFile, EngineError> {
    copy_replacing(src, dest)?;
    tracing::info!("copy {} to {} success.", src.display(), dest.display());
    Ok(CollectedFile {
        path: dest.to_path_buf(),
        sha256: sha256_file(dest)?,
    })
}

/// Delete the working directory, logging instead of failing.
pub fn clean_work_dir(work_dir: &Path) {
    match remove_tree(work_dir) {
        Ok(()) => tracing::debug!("removed {}", work_dir.display()),
        Err(e) => tracing::warn!("cannot clean {}: {e}", work_dir.display()),
    }
}
