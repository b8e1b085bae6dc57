//! Facade orchestration: prepare, copy sources, resolve, render, install, collect.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use facade_config::config::{FacadeConfig, Mediation};
use facade_mvn::{BuildContext, BuildTool};
use facade_util::fs::{ensure_dir, remove_tree, WalkOptions};
use facade_util::maven::MavenCoordinate;
use facade_util::pom::{ParentRef, PomModel};

use crate::collect::{clean_work_dir, collect_outputs, CollectedFile};
use crate::descriptor::{render_descriptor, write_descriptor, FacadeMode, FacadeModuleSpec, License};
use crate::error::{EngineError, Stage};
use crate::filter::{drop_scopes, filter_artifacts, ExcludeRules, FilterRule};
use crate::invoker::{fetch_dependency_tree, install};
use crate::modules::{discover_root, MissingModulePolicy, ModelReader, ModuleRegistry};
use crate::sources::{copy_sources, select_sources};
use crate::tree::parse_dependency_tree;

const POM_FILE: &str = "pom.xml";
const FACADE_SUFFIX: &str = "-facade";

/// Fully resolved inputs of one run.
#[derive(Debug, Clone)]
pub struct FacadeRequest {
    /// Directory of the base project whose dependencies are extracted.
    pub base_dir: PathBuf,
    /// Root of the multi-module project; its modules are internal.
    pub root_dir: PathBuf,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub parent: Option<ParentRef>,
    pub licenses: Vec<License>,
    pub java_version: String,
    /// Source inclusion patterns; empty means no sources are copied.
    pub source_patterns: Vec<FilterRule>,
    pub exclude: ExcludeRules,
    /// Dependencies with these scopes are left out.
    pub exclude_scopes: Vec<String>,
    pub mediation: Mediation,
    pub module_policy: MissingModulePolicy,
    /// Delete the working directory when the run ends.
    pub clean_after: bool,
    pub output_dir: PathBuf,
}

impl FacadeRequest {
    /// Build a request from configuration, filling identity gaps from the base project's POM.
    ///
    /// `root_dir` defaults to the topmost ancestor of `base_dir` that still
    /// holds a `pom.xml`.
    ///
    /// # Errors
    /// Returns `EngineError::Identity` if an identity field is unset and the
    /// base POM cannot supply it, or if the artifactId cannot name a directory.
    pub fn from_config(
        config: &FacadeConfig,
        base_dir: &Path,
        root_dir: Option<&Path>,
        reader: &dyn ModelReader,
    ) -> Result<Self, EngineError> {
        let facade = &config.facade;

        let needs_base =
            facade.group_id.is_none() || facade.artifact_id.is_none() || facade.version.is_none();
        let base_pom = base_dir.join(POM_FILE);
        let base: Option<PomModel> = if needs_base {
            match reader.read_model(&base_pom) {
                Ok(model) => Some(model),
                Err(e) => {
                    tracing::debug!("cannot read {}: {e}", base_pom.display());
                    None
                }
            }
        } else {
            None
        };

        let missing = |field: &str| EngineError::Identity {
            field: field.to_owned(),
            reason: format!(
                "not configured and not declared in {}",
                base_pom.display()
            ),
        };

        let group_id = match &facade.group_id {
            Some(g) => g.clone(),
            None => base
                .as_ref()
                .and_then(PomModel::effective_group_id)
                .map(str::to_owned)
                .ok_or_else(|| missing("groupId"))?,
        };
        let artifact_id = match &facade.artifact_id {
            Some(a) => a.clone(),
            None => base
                .as_ref()
                .map(|b| format!("{}{FACADE_SUFFIX}", b.artifact_id))
                .ok_or_else(|| missing("artifactId"))?,
        };
        let version = match &facade.version {
            Some(v) => v.clone(),
            None => base
                .as_ref()
                .and_then(PomModel::effective_version)
                .map(str::to_owned)
                .ok_or_else(|| missing("version"))?,
        };
        validate_artifact_id(&artifact_id)?;

        let module_policy = if config.build.skip_unreadable_modules {
            MissingModulePolicy::Skip
        } else {
            MissingModulePolicy::Fail
        };

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            root_dir: root_dir.map_or_else(|| discover_root(base_dir), Path::to_path_buf),
            group_id,
            artifact_id,
            version,
            parent: config.parent.as_ref().map(|p| ParentRef {
                group_id: p.group_id.clone(),
                artifact_id: p.artifact_id.clone(),
                version: p.version.clone(),
            }),
            licenses: config
                .licenses
                .iter()
                .map(|l| License {
                    name: l.name.clone(),
                    url: l.url.clone(),
                })
                .collect(),
            java_version: facade.java_version.clone(),
            source_patterns: FilterRule::parse_all(&config.sources.include),
            exclude: ExcludeRules::from_patterns(
                &config.exclude.group_ids,
                &config.exclude.artifact_ids,
            ),
            exclude_scopes: config.exclude.scopes.clone(),
            mediation: config.build.mediation,
            module_policy,
            clean_after: facade.clean_after,
            output_dir: base_dir.join(&facade.output_dir),
        })
    }

    /// Directory the facade module is generated in.
    pub fn work_dir(&self) -> PathBuf {
        self.base_dir.join(&self.artifact_id)
    }

    fn base_pom(&self) -> PathBuf {
        self.base_dir.join(POM_FILE)
    }
}

/// The artifactId doubles as the working directory name under the base dir.
fn validate_artifact_id(artifact_id: &str) -> Result<(), EngineError> {
    let reject = |reason: &str| EngineError::Identity {
        field: "artifactId".to_owned(),
        reason: format!("\"{artifact_id}\" {reason}"),
    };
    if artifact_id.trim().is_empty() {
        return Err(reject("is empty"));
    }
    if artifact_id == "." || artifact_id == ".." {
        return Err(reject("is not a directory name"));
    }
    if artifact_id.contains(['/', '\\']) {
        return Err(reject("contains a path separator"));
    }
    Ok(())
}

/// External collaborators of a run, passed explicitly.
#[derive(Clone, Copy)]
pub struct PipelineEnv<'a> {
    /// Runs Maven.
    pub tool: &'a dyn BuildTool,
    /// Reads module descriptors.
    pub reader: &'a dyn ModelReader,
    /// Flags, profiles, settings and properties forwarded to every Maven run.
    pub context: &'a BuildContext,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct FacadeOutcome {
    pub mode: FacadeMode,
    /// Where the module was generated (gone again if it was cleaned).
    pub work_dir: PathBuf,
    /// The descriptor copy in the output directory.
    pub descriptor: PathBuf,
    /// Dependencies written to the descriptor.
    pub dependencies: Vec<MavenCoordinate>,
    /// Number of source files copied into the module.
    pub copied_sources: usize,
    /// Files placed in the output directory.
    pub collected: Vec<CollectedFile>,
    pub duration: Duration,
}

/// Generate, build and collect a facade module.
///
/// # Errors
/// Returns an error labelled with the failing [`Stage`].
pub fn package_facade(
    request: &FacadeRequest,
    env: PipelineEnv<'_>,
) -> Result<FacadeOutcome, EngineError> {
    execute(FacadeMode::Facade, request, env)
}

/// Generate, build and collect a base-dependency module.
///
/// # Errors
/// Returns an error labelled with the failing [`Stage`].
pub fn package_base_dependency(
    request: &FacadeRequest,
    env: PipelineEnv<'_>,
) -> Result<FacadeOutcome, EngineError> {
    execute(FacadeMode::BaseDependency, request, env)
}

/// Run the whole pipeline in `mode`.
///
/// Steps:
/// 1. Recreate the working directory `<base>/<artifactId>`
/// 2. Copy selected sources (facade mode)
/// 3. Resolve the root project's modules
/// 4. Run `dependency:tree`, flatten, and filter
/// 5. Render and write `pom.xml`
/// 6. Run `install`
/// 7. Copy jars and the descriptor to the output directory
///
/// With `clean_after` set, the working directory is removed afterwards,
/// whether or not the run succeeded.
///
/// # Errors
/// Returns the first failure, wrapped in `EngineError::Stage`.
pub fn execute(
    mode: FacadeMode,
    request: &FacadeRequest,
    env: PipelineEnv<'_>,
) -> Result<FacadeOutcome, EngineError> {
    let start = Instant::now();
    let work_dir = request.work_dir();

    let result = run(mode, request, env, &work_dir);

    if request.clean_after {
        clean_work_dir(&work_dir);
    }

    let mut outcome = result?;
    outcome.duration = start.elapsed();
    Ok(outcome)
}

fn run(
    mode: FacadeMode,
    request: &FacadeRequest,
    env: PipelineEnv<'_>,
    work_dir: &Path,
) -> Result<FacadeOutcome, EngineError> {
    let java_dir = work_dir.join("src/main/java");
    prepare_work_dir(work_dir, mode, &java_dir).map_err(|e| e.in_stage(Stage::Prepare))?;
    tracing::info!("create base facade directory success: {}", work_dir.display());

    let mut source_files = Vec::new();
    if mode == FacadeMode::Facade && !request.source_patterns.is_empty() {
        let options = WalkOptions {
            skip_dirs: vec![work_dir.to_path_buf(), request.output_dir.clone()],
            ..WalkOptions::default()
        };
        let selected = select_sources(&request.root_dir, &request.source_patterns, &options)
            .and_then(|selected| copy_sources(&selected, &java_dir).map(|()| selected))
            .map_err(|e| e.in_stage(Stage::CopySources))?;
        tracing::info!("copy java files success.");
        source_files = selected.into_iter().map(|s| s.relative_target).collect();
    }

    let dependencies = resolve_dependencies(request, env)?;

    let spec = FacadeModuleSpec {
        group_id: request.group_id.clone(),
        artifact_id: request.artifact_id.clone(),
        version: request.version.clone(),
        mode,
        parent: request.parent.clone(),
        licenses: licenses_for(mode, &request.licenses),
        dependencies,
        source_files,
        java_version: request.java_version.clone(),
    };
    let pom = work_dir.join(POM_FILE);
    render_descriptor(&spec)
        .and_then(|text| write_descriptor(&pom, &text))
        .map_err(|e| e.in_stage(Stage::RenderDescriptor))?;
    tracing::info!("analyze all dependencies and write facade pom.xml success.");

    install(env.tool, &pom, env.context).map_err(|e| e.in_stage(Stage::Install))?;
    tracing::info!("package base facade success.");

    let collected = collect_outputs(work_dir, &pom, &request.output_dir)
        .map_err(|e| e.in_stage(Stage::CollectOutputs))?;

    Ok(FacadeOutcome {
        mode,
        work_dir: work_dir.to_path_buf(),
        descriptor: request.output_dir.join(POM_FILE),
        dependencies: spec.dependencies,
        copied_sources: spec.source_files.len(),
        collected,
        duration: Duration::ZERO,
    })
}

fn prepare_work_dir(work_dir: &Path, mode: FacadeMode, java_dir: &Path) -> Result<(), EngineError> {
    remove_tree(work_dir)?;
    ensure_dir(work_dir)?;
    if mode == FacadeMode::Facade {
        ensure_dir(java_dir)?;
    }
    Ok(())
}

fn licenses_for(mode: FacadeMode, configured: &[License]) -> Vec<License> {
    if mode == FacadeMode::BaseDependency && configured.is_empty() {
        vec![License::apache()]
    } else {
        configured.to_vec()
    }
}

/// Compute the dependencies a facade of `request` would declare, without generating anything.
///
/// # Errors
/// Returns an error labelled with the failing [`Stage`].
pub fn list_dependencies(
    request: &FacadeRequest,
    env: PipelineEnv<'_>,
) -> Result<Vec<MavenCoordinate>, EngineError> {
    resolve_dependencies(request, env)
}

fn resolve_dependencies(
    request: &FacadeRequest,
    env: PipelineEnv<'_>,
) -> Result<Vec<MavenCoordinate>, EngineError> {
    let registry = ModuleRegistry::resolve(env.reader, &request.root_dir, request.module_policy)
        .map_err(|e| e.in_stage(Stage::ResolveModules))?;

    tracing::info!("root project path: {}", request.root_dir.display());
    let all = fetch_dependency_tree(env.tool, &request.base_pom(), &request.base_dir, env.context)
        .and_then(|text| parse_dependency_tree(&text, request.mediation))
        .map_err(|e| e.in_stage(Stage::DependencyTree))?;

    let total = all.len();
    let kept = drop_scopes(all, &request.exclude_scopes);
    let filtered = filter_artifacts(&kept, &request.exclude, registry.artifact_ids());
    tracing::debug!(
        "{} of {total} dependencies kept ({} internal modules)",
        filtered.len(),
        registry.artifact_ids().len()
    );
    Ok(filtered)
}
