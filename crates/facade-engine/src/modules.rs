//! Internal modules of the base project.
//!
//! Every artifactId listed (directly or through nested aggregators) in the
//! root project's `<modules>` block belongs to the base project itself and
//! must never end up as an external dependency of the facade.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use facade_util::error::UtilError;
use facade_util::pom::PomModel;

use crate::error::EngineError;

const POM_FILE: &str = "pom.xml";

/// Reads a module descriptor from disk.
pub trait ModelReader {
    /// Read the model of the descriptor at `pom`.
    ///
    /// # Errors
    /// Returns an error if the descriptor is missing or unreadable.
    fn read_model(&self, pom: &Path) -> Result<PomModel, UtilError>;
}

/// [`ModelReader`] backed by [`PomModel::from_path`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PomReader;

impl ModelReader for PomReader {
    fn read_model(&self, pom: &Path) -> Result<PomModel, UtilError> {
        PomModel::from_path(pom)
    }
}

/// What to do when a listed module cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingModulePolicy {
    /// Abort the run.
    #[default]
    Fail,
    /// Log a warning and continue without the module.
    Skip,
}

/// The set of artifactIds internal to the base project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistry {
    artifact_ids: BTreeSet<String>,
}

impl ModuleRegistry {
    /// Read the root project at `root_dir` and resolve all of its modules.
    ///
    /// # Errors
    /// Returns `EngineError::Resolution` if the root descriptor cannot be
    /// read, or if a module cannot be read under [`MissingModulePolicy::Fail`].
    pub fn resolve(
        reader: &dyn ModelReader,
        root_dir: &Path,
        policy: MissingModulePolicy,
    ) -> Result<Self, EngineError> {
        let root_pom = root_dir.join(POM_FILE);
        let root = reader
            .read_model(&root_pom)
            .map_err(|source| EngineError::Resolution {
                module: ".".to_owned(),
                path: root_pom.display().to_string(),
                source,
            })?;
        Self::from_modules(reader, root_dir, &root.modules, policy)
    }

    /// Resolve `modules`, declared relative to `base_dir`, and every module nested below them.
    ///
    /// A module entry names either a directory holding a `pom.xml` or the
    /// descriptor file itself.
    ///
    /// # Errors
    /// Returns `EngineError::Resolution` if a module cannot be read under
    /// [`MissingModulePolicy::Fail`].
    pub fn from_modules(
        reader: &dyn ModelReader,
        base_dir: &Path,
        modules: &[String],
        policy: MissingModulePolicy,
    ) -> Result<Self, EngineError> {
        let mut artifact_ids = BTreeSet::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, String)> = modules
            .iter()
            .map(|m| (base_dir.to_path_buf(), m.clone()))
            .collect();

        while let Some((dir, module)) = queue.pop_front() {
            let pom = module_descriptor(&dir, &module);
            let key = pom.canonicalize().unwrap_or_else(|_| pom.clone());
            if !visited.insert(key) {
                continue;
            }

            let model = match reader.read_model(&pom) {
                Ok(model) => model,
                Err(source) => {
                    let err = EngineError::Resolution {
                        module: module.clone(),
                        path: pom.display().to_string(),
                        source,
                    };
                    if policy == MissingModulePolicy::Skip {
                        tracing::warn!("{err}; skipping");
                        continue;
                    }
                    return Err(err);
                }
            };

            tracing::info!("find maven module of base: {}", model.artifact_id);
            let module_dir = pom.parent().map_or_else(|| dir.clone(), Path::to_path_buf);
            queue.extend(model.modules.iter().map(|m| (module_dir.clone(), m.clone())));
            artifact_ids.insert(model.artifact_id);
        }

        Ok(Self { artifact_ids })
    }

    /// All internal artifactIds, sorted.
    pub fn artifact_ids(&self) -> &BTreeSet<String> {
        &self.artifact_ids
    }
}

fn module_descriptor(dir: &Path, module: &str) -> PathBuf {
    let path = dir.join(module);
    let is_descriptor = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
    if is_descriptor {
        path
    } else {
        path.join(POM_FILE)
    }
}

/// Find the root project for `base_dir`: the topmost ancestor (including
/// `base_dir` itself) whose chain of directories all hold a `pom.xml`.
///
/// Returns `base_dir` when its parent has no `pom.xml`.
pub fn discover_root(base_dir: &Path) -> PathBuf {
    let mut root = base_dir.to_path_buf();
    while let Some(parent) = root.parent() {
        if parent.as_os_str().is_empty() || !parent.join(POM_FILE).is_file() {
            break;
        }
        root = parent.to_path_buf();
    }
    root
}
