//! Selection of Java sources to copy into the facade module.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use facade_util::fs::{collect_files_with, copy_replacing, WalkOptions};

use crate::error::EngineError;
use crate::filter::FilterRule;

/// Directory marker that separates a module path from a package path.
pub const SOURCE_MARKER: &str = "src/main/java/";

/// Extension of the files that are considered.
pub const SOURCE_EXTENSION: &str = "java";

/// One source file picked for the facade module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    /// Absolute path of the file in the base project.
    pub source: PathBuf,
    /// Path under the facade's `src/main/java`, e.g. `com/acme/api/Widget.java`.
    pub relative_target: PathBuf,
    /// Fully-qualified class name, e.g. `com.acme.api.Widget`.
    pub qualified_name: String,
}

/// Split a source path into its package-relative path and its fully-qualified name.
///
/// Returns `None` when the path does not end in `.java` or does not contain
/// [`SOURCE_MARKER`] exactly once.
pub fn qualified_name(path: &Path) -> Option<(String, String)> {
    let normalized = normalized_path(path);
    if normalized.matches(SOURCE_MARKER).count() != 1 {
        return None;
    }
    let (_, relative) = normalized.split_once(SOURCE_MARKER)?;
    let stem = relative.strip_suffix(".java")?;
    if stem.is_empty() {
        return None;
    }
    Some((relative.to_owned(), stem.replace('/', ".")))
}

fn normalized_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Walk `root` and select every source file whose qualified name satisfies one of `patterns`.
///
/// Matching uses the same raw prefix test as the dependency filter:
/// `com.acme.api.*` also selects `com.acme.apiextra.Widget`. When two files
/// map to the same target, the later one in path order wins.
///
/// # Errors
/// Returns an error if the tree cannot be walked.
pub fn select_sources(
    root: &Path,
    patterns: &[FilterRule],
    options: &WalkOptions,
) -> Result<Vec<SourceSelection>, EngineError> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let root = root.canonicalize().map_err(|source| EngineError::Io {
        path: root.display().to_string(),
        source,
    })?;

    let mut by_target: BTreeMap<PathBuf, SourceSelection> = BTreeMap::new();
    for file in collect_files_with(&root, SOURCE_EXTENSION, options)? {
        let Some((relative, name)) = qualified_name(&file) else {
            // Files outside any source root (src/test/java and the like) are silently ignored.
            if normalized_path(&file).matches(SOURCE_MARKER).count() > 1 {
                tracing::warn!(
                    "skip {}: `{SOURCE_MARKER}` occurs more than once in the path",
                    file.display()
                );
            }
            continue;
        };
        if !patterns.iter().any(|p| p.matches(&name)) {
            continue;
        }

        tracing::debug!("select {name}");
        let relative_target = PathBuf::from(relative);
        let selection = SourceSelection {
            source: file,
            relative_target: relative_target.clone(),
            qualified_name: name,
        };
        if let Some(previous) = by_target.insert(relative_target, selection) {
            tracing::warn!(
                "{} is provided more than once; {} is replaced",
                previous.qualified_name,
                previous.source.display()
            );
        }
    }

    Ok(by_target.into_values().collect())
}

/// Copy the selected files under `target_dir`, replacing existing files.
///
/// # Errors
/// Returns an error if a file cannot be copied.
pub fn copy_sources(selections: &[SourceSelection], target_dir: &Path) -> Result<(), EngineError> {
    for selection in selections {
        let dest = target_dir.join(&selection.relative_target);
        copy_replacing(&selection.source, &dest)?;
        tracing::info!(
            "copy java from {} to {} success.",
            selection.source.display(),
            dest.display()
        );
    }
    Ok(())
}
