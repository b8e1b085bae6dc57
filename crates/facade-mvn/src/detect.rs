//! Maven detection and version parsing.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::MvnError;

/// Information about a detected Maven installation.
#[derive(Debug, Clone)]
pub struct MvnInfo {
    /// Absolute path to the `mvn` launcher.
    pub path: PathBuf,
    /// Parsed version (e.g. "3.9.6").
    pub version: String,
}

#[cfg(windows)]
const MVN_BINARY: &str = "mvn.cmd";
#[cfg(not(windows))]
const MVN_BINARY: &str = "mvn";

/// Locate `mvn` and query its version.
///
/// # Errors
/// Returns an error if `mvn` cannot be located, is not executable, or
/// reports a version that cannot be parsed.
pub fn detect_mvn(explicit: Option<&Path>) -> Result<MvnInfo, MvnError> {
    let path = locate_mvn(explicit)?;
    let version = query_version(&path)?;
    Ok(MvnInfo { path, version })
}

/// Locate the `mvn` launcher without running it.
///
/// Resolution order:
/// 1. `explicit`, when given (must exist)
/// 2. `MAVEN_HOME` then `M2_HOME` (`$HOME/bin/mvn`)
/// 3. `PATH` lookup via `which`
///
/// # Errors
/// Returns an error if no launcher is found or the one found is not executable.
pub fn locate_mvn(explicit: Option<&Path>) -> Result<PathBuf, MvnError> {
    let path = resolve_mvn_path(explicit, |key| std::env::var(key).ok())?;
    check_executable(&path)?;
    Ok(path)
}

fn resolve_mvn_path(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, MvnError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(MvnError::ConfiguredNotFound {
            path: path.to_path_buf(),
        });
    }

    for key in ["MAVEN_HOME", "M2_HOME"] {
        if let Some(home) = env(key).filter(|h| !h.trim().is_empty()) {
            let p = PathBuf::from(home).join("bin").join(MVN_BINARY);
            if p.exists() {
                return Ok(p);
            }
        }
    }

    which_mvn().ok_or(MvnError::NotFound)
}

fn which_mvn() -> Option<PathBuf> {
    let output = Command::new("which").arg(MVN_BINARY).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path_str = String::from_utf8_lossy(&output.stdout);
    let trimmed = path_str.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn check_executable(path: &Path) -> Result<(), MvnError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path).map_err(|_| MvnError::NotExecutable {
            path: path.to_path_buf(),
        })?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(MvnError::NotExecutable {
                path: path.to_path_buf(),
            });
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Parse the Maven version from raw `mvn -v` output.
///
/// Handles `Apache Maven 3.9.6 (bc0240f3...)` and bare `3.9.6`.
pub fn parse_version(raw: &str) -> Option<String> {
    let first_line = raw.lines().find(|l| !l.trim().is_empty())?;
    first_line
        .split_whitespace()
        .map(|t| t.trim_start_matches('v'))
        .find(|t| is_version_like(t))
        .map(str::to_owned)
}

fn is_version_like(s: &str) -> bool {
    let core = s.split('-').next().unwrap_or(s);
    let parts: Vec<&str> = core.split('.').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn query_version(path: &Path) -> Result<String, MvnError> {
    let output = Command::new(path)
        .arg("-v")
        .output()
        .map_err(|source| MvnError::Exec { source })?;

    let raw = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    parse_version(&raw).ok_or(MvnError::VersionParse { output: raw })
}
