//! Filesystem utilities for the facade tool.
//!
//! Tree walks and tree deletion use an explicit work stack rather than
//! recursion, and both stop with [`UtilError::WalkLimit`] once they have
//! touched more than their entry budget.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::UtilError;

/// Default upper bound on entries visited by a single walk or delete.
pub const DEFAULT_MAX_ENTRIES: usize = 1_000_000;

fn io_err(path: &Path, source: std::io::Error) -> UtilError {
    UtilError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// The user's home directory, from `HOME` (Unix) or `USERPROFILE` (Windows).
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(|source| io_err(path, source))
}

/// Copy `src` to `dest`, replacing whatever is at `dest`.
///
/// Parent directories of `dest` are created as needed.
///
/// # Errors
/// Returns an error if the parent cannot be created or the copy fails.
pub fn copy_replacing(src: &Path, dest: &Path) -> Result<(), UtilError> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }

    // A read-only or hard-linked destination must not be written through.
    if dest.symlink_metadata().is_ok() {
        std::fs::remove_file(dest).map_err(|source| io_err(dest, source))?;
    }

    std::fs::copy(src, dest).map_err(|source| io_err(dest, source))?;
    Ok(())
}

/// Remove a directory tree. No error if the path is absent.
///
/// Symlinks are removed, never followed.
///
/// # Errors
/// Returns an error if any entry cannot be removed, or if the tree holds
/// more than [`DEFAULT_MAX_ENTRIES`] entries.
pub fn remove_tree(path: &Path) -> Result<(), UtilError> {
    remove_tree_bounded(path, DEFAULT_MAX_ENTRIES)
}

fn remove_tree_bounded(path: &Path, max_entries: usize) -> Result<(), UtilError> {
    match path.symlink_metadata() {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(io_err(path, source)),
    }

    // (path, children already pushed)
    let mut stack: Vec<(PathBuf, bool)> = vec![(path.to_path_buf(), false)];
    let mut seen = 0usize;

    while let Some((current, expanded)) = stack.pop() {
        let meta = current
            .symlink_metadata()
            .map_err(|source| io_err(&current, source))?;

        if !meta.is_dir() {
            std::fs::remove_file(&current).map_err(|source| io_err(&current, source))?;
            continue;
        }

        if expanded {
            std::fs::remove_dir(&current).map_err(|source| io_err(&current, source))?;
            continue;
        }

        stack.push((current.clone(), true));
        let entries = std::fs::read_dir(&current).map_err(|source| io_err(&current, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| io_err(&current, source))?;
            seen += 1;
            if seen > max_entries {
                return Err(UtilError::WalkLimit {
                    root: path.display().to_string(),
                    limit: max_entries,
                });
            }
            stack.push((entry.path(), false));
        }
    }

    Ok(())
}

/// Options for [`collect_files_with`].
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directories that are not descended into.
    pub skip_dirs: Vec<PathBuf>,
    /// Upper bound on the number of directory entries examined.
    pub max_entries: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            skip_dirs: Vec::new(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Collect all files with the given `extension` under `dir`, sorted by path,
/// honouring skip directories and an entry budget.
///
/// Directories reached twice (through symlinks) are walked once.
///
/// # Errors
/// Returns an error if a directory cannot be read or the entry budget is exceeded.
pub fn collect_files_with(
    dir: &Path,
    extension: &str,
    options: &WalkOptions,
) -> Result<Vec<PathBuf>, UtilError> {
    let skip: HashSet<PathBuf> = options
        .skip_dirs
        .iter()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .collect();

    let mut files = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![dir.to_path_buf()];
    let mut seen = 0usize;

    while let Some(current) = stack.pop() {
        let canonical = current
            .canonicalize()
            .map_err(|source| io_err(&current, source))?;
        if skip.contains(&canonical) || !visited.insert(canonical) {
            continue;
        }

        let entries = std::fs::read_dir(&current).map_err(|source| io_err(&current, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| io_err(&current, source))?;
            seen += 1;
            if seen > options.max_entries {
                return Err(UtilError::WalkLimit {
                    root: dir.display().to_string(),
                    limit: options.max_entries,
                });
            }

            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == extension)
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn ensure_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn copy_replacing_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("Widget.java");
        let dest = tmp.path().join("com").join("acme").join("Widget.java");
        fs::write(&src, b"class Widget {}").unwrap();

        copy_replacing(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"class Widget {}");
    }

    #[test]
    fn copy_replacing_overwrites_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.txt");
        let dest = tmp.path().join("dest.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old but longer").unwrap();

        copy_replacing(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn remove_tree_removes_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("facade");
        fs::create_dir_all(dir.join("src/main/java/com/acme")).unwrap();
        fs::write(dir.join("pom.xml"), b"<project/>").unwrap();
        fs::write(dir.join("src/main/java/com/acme/A.java"), b"").unwrap();

        remove_tree(&dir).unwrap();
        assert!(!dir.exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn remove_tree_absent_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        remove_tree(&tmp.path().join("nonexistent")).unwrap();
    }

    #[test]
    fn remove_tree_single_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("deps.log.1");
        fs::write(&file, b"x").unwrap();
        remove_tree(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn remove_tree_respects_budget() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("big");
        fs::create_dir_all(&dir).unwrap();
        for i in 0..5 {
            fs::write(dir.join(format!("{i}.txt")), b"").unwrap();
        }
        let err = remove_tree_bounded(&dir, 3).unwrap_err();
        assert!(err.to_string().contains("exceeded 3 entries"), "error was: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn remove_tree_does_not_follow_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("keep.txt"), b"keep").unwrap();

        let dir = tmp.path().join("work");
        fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink(&outside, dir.join("link")).unwrap();

        remove_tree(&dir).unwrap();
        assert!(!dir.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[test]
    fn collect_files_finds_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("src");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("B.java"), b"").unwrap();
        fs::write(sub.join("A.java"), b"").unwrap();
        fs::write(tmp.path().join("C.java"), b"").unwrap();
        fs::write(tmp.path().join("readme.md"), b"").unwrap();

        let files = collect_files_with(tmp.path(), "java", &WalkOptions::default()).unwrap();
        assert_eq!(files.len(), 3);
        for i in 0..files.len().saturating_sub(1) {
            assert!(files.get(i) <= files.get(i + 1));
        }
    }

    #[test]
    fn collect_files_skips_configured_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let keep = tmp.path().join("app");
        let skip = tmp.path().join("facade");
        fs::create_dir_all(&keep).unwrap();
        fs::create_dir_all(&skip).unwrap();
        fs::write(keep.join("A.java"), b"").unwrap();
        fs::write(skip.join("B.java"), b"").unwrap();

        let options = WalkOptions {
            skip_dirs: vec![skip],
            ..WalkOptions::default()
        };
        let files = collect_files_with(tmp.path(), "java", &options).unwrap();
        assert_eq!(files, vec![keep.join("A.java")]);
    }

    #[cfg(unix)]
    #[test]
    fn collect_files_survives_symlink_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("A.java"), b"").unwrap();
        std::os::unix::fs::symlink(tmp.path(), dir.join("loop")).unwrap();

        let files = collect_files_with(tmp.path(), "java", &WalkOptions::default()).unwrap();
        assert_eq!(files, vec![dir.join("A.java")]);
    }

    #[test]
    fn collect_files_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let files = collect_files_with(tmp.path(), "java", &WalkOptions::default()).unwrap();
        assert!(files.is_empty());
    }
}
