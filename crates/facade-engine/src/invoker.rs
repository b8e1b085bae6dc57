//! The two Maven runs of the pipeline: `dependency:tree` and `install`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use facade_mvn::{BuildContext, BuildTool, InvocationResult, MvnCommand};

use crate::error::EngineError;

const TREE_GOAL: &str = "dependency:tree";
const INSTALL_GOAL: &str = "install";

/// A unique path for the dependency-tree dump inside `dir`.
///
/// The name carries the current time in milliseconds and the process id, so
/// concurrent runs in the same directory do not collide.
pub fn dump_file_path(dir: &Path) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    dir.join(format!("deps.log.{millis}.{}", std::process::id()))
}

/// Deletes the dump file when dropped, whatever happened in between.
struct DumpGuard {
    path: PathBuf,
}

impl Drop for DumpGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!("cannot delete {}: {e}", self.path.display());
            }
        }
    }
}

fn ensure_success(goal: &str, result: &InvocationResult) -> Result<(), EngineError> {
    if result.success() {
        return Ok(());
    }
    Err(EngineError::Invocation {
        goal: goal.to_owned(),
        detail: result.summary(),
    })
}

/// Run `dependency:tree` on `pom` and return the dumped tree text.
///
/// The dump is written to a fresh file in `dump_dir` and removed again before
/// returning, also on failure.
///
/// # Errors
/// Returns an error if Maven cannot be started, exits non-zero, or the dump
/// cannot be read.
pub fn fetch_dependency_tree(
    tool: &dyn BuildTool,
    pom: &Path,
    dump_dir: &Path,
    context: &BuildContext,
) -> Result<String, EngineError> {
    let guard = DumpGuard {
        path: dump_file_path(dump_dir),
    };
    let command = MvnCommand::new()
        .pom(pom)
        .goal(TREE_GOAL)
        .goal(&format!("-DoutputFile={}", guard.path.display()))
        .context(context);

    let result = tool.invoke(&command)?;
    ensure_success(TREE_GOAL, &result)?;

    std::fs::read_to_string(&guard.path).map_err(|source| EngineError::Io {
        path: guard.path.display().to_string(),
        source,
    })
}

/// Run `install` on the generated descriptor.
///
/// # Errors
/// Returns an error if Maven cannot be started or exits non-zero.
pub fn install(
    tool: &dyn BuildTool,
    pom: &Path,
    context: &BuildContext,
) -> Result<InvocationResult, EngineError> {
    let command = MvnCommand::new().pom(pom).goal(INSTALL_GOAL).context(context);
    let result = tool.invoke(&command)?;
    ensure_success(INSTALL_GOAL, &result)?;
    Ok(result)
}
