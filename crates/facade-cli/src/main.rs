#![forbid(unsafe_code)]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use facade_config::FacadeConfig;
use facade_engine::{FacadeMode, FacadeRequest, ModelReader, PipelineEnv, PomReader};
use facade_mvn::{BuildContext, MavenInvoker};
use facade_util::fs::home_dir;

type CliResult = Result<(), Box<dyn Error>>;

const CONFIG_FILE: &str = "facade.toml";
const LOG_ENV: &str = "FACADE_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "facade",
    about = "Extract a facade module from a Maven multi-module project"
)]
#[command(version)]
struct Cli {
    /// Log per-file and per-dependency detail
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate, build and collect a facade module
    Package(FacadeArgs),
    /// Generate, build and collect a base-dependency module
    BaseDependency(FacadeArgs),
    /// Print the dependencies a facade would declare, without building anything
    Deps(FacadeArgs),
    /// Check environment and Maven setup
    Doctor {
        /// Base project directory (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Path to the mvn launcher
        #[arg(long)]
        mvn: Option<PathBuf>,
    },
}

/// Options shared by every command that runs the pipeline.
#[derive(Debug, Args)]
struct FacadeArgs {
    /// Base project directory (defaults to the current directory)
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Configuration file (defaults to <dir>/facade.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Root of the multi-module project (defaults to the topmost ancestor holding a pom.xml)
    #[arg(long)]
    root_dir: Option<PathBuf>,
    /// groupId of the generated module
    #[arg(long)]
    group_id: Option<String>,
    /// artifactId of the generated module
    #[arg(long)]
    artifact_id: Option<String>,
    /// Version of the generated module
    #[arg(long = "version")]
    facade_version: Option<String>,
    /// Class name or package prefix ending in `.*` to copy into the module (repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    include: Vec<String>,
    /// groupId or prefix ending in `.*` to leave out (repeatable)
    #[arg(long = "exclude-group-id", value_name = "PATTERN")]
    exclude_group_ids: Vec<String>,
    /// artifactId or prefix ending in `.*` to leave out (repeatable)
    #[arg(long = "exclude-artifact-id", value_name = "PATTERN")]
    exclude_artifact_ids: Vec<String>,
    /// Keep the generated working directory
    #[arg(long)]
    no_clean: bool,
    /// Maven profile to activate (repeatable)
    #[arg(long = "profile", value_name = "NAME")]
    profiles: Vec<String>,
    /// User property forwarded to Maven (repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,
    /// Let Maven prompt instead of running in batch mode
    #[arg(long)]
    interactive: bool,
    /// Maven user settings file
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Maven global settings file
    #[arg(long)]
    global_settings: Option<PathBuf>,
    /// Path to the mvn launcher
    #[arg(long)]
    mvn: Option<PathBuf>,
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.to_owned(), value.to_owned())),
        Some(_) => Err(format!("property `{raw}` has an empty key")),
        None => Err(format!("property `{raw}` must have the form KEY=VALUE")),
    }
}

impl FacadeArgs {
    fn base_dir(&self) -> Result<PathBuf, Box<dyn Error>> {
        resolve_base_dir(self.dir.as_deref())
    }

    /// Read the configuration file and lay the command-line flags over it.
    fn load_config(&self, base_dir: &Path) -> Result<FacadeConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => FacadeConfig::from_path(path)?,
            None => FacadeConfig::from_path_or_default(&base_dir.join(CONFIG_FILE))?,
        };
        self.apply(&mut config);
        config.validate("command line")?;
        Ok(config)
    }

    fn apply(&self, config: &mut FacadeConfig) {
        if let Some(group_id) = &self.group_id {
            config.facade.group_id = Some(group_id.clone());
        }
        if let Some(artifact_id) = &self.artifact_id {
            config.facade.artifact_id = Some(artifact_id.clone());
        }
        if let Some(version) = &self.facade_version {
            config.facade.version = Some(version.clone());
        }
        if !self.include.is_empty() {
            config.sources.include.clone_from(&self.include);
        }
        if !self.exclude_group_ids.is_empty() {
            config.exclude.group_ids.clone_from(&self.exclude_group_ids);
        }
        if !self.exclude_artifact_ids.is_empty() {
            config.exclude.artifact_ids.clone_from(&self.exclude_artifact_ids);
        }
        if self.no_clean {
            config.facade.clean_after = false;
        }
        if !self.profiles.is_empty() {
            config.build.profiles.clone_from(&self.profiles);
        }
        for (key, value) in &self.properties {
            config.build.properties.insert(key.clone(), value.clone());
        }
        if self.interactive {
            config.build.interactive = true;
        }
        if let Some(settings) = &self.settings {
            config.build.user_settings = Some(settings.clone());
        }
        if let Some(settings) = &self.global_settings {
            config.build.global_settings = Some(settings.clone());
        }
        if let Some(mvn) = &self.mvn {
            config.build.mvn = Some(mvn.clone());
        }
    }
}

/// Settings paths are resolved against `cwd` and `home` here, since Maven
/// itself runs from the generated module's directory.
fn build_context(config: &FacadeConfig, cwd: &Path, home: Option<&Path>) -> BuildContext {
    BuildContext {
        interactive: config.build.interactive,
        profiles: config.build.profiles.clone(),
        user_settings: config.build.user_settings.clone(),
        global_settings: config.build.global_settings.clone(),
        properties: config.build.properties.clone(),
    }
    .anchored(cwd, home)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Package(args) => cmd_package(FacadeMode::Facade, &args),
        Command::BaseDependency(args) => cmd_package(FacadeMode::BaseDependency, &args),
        Command::Deps(args) => cmd_deps(&args),
        Command::Doctor { dir, mvn } => cmd_doctor(dir.as_deref(), mvn.as_deref()),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise the flags pick the level, then `FACADE_LOG`, then `info`.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = if verbose {
            "debug".to_owned()
        } else if quiet {
            "error".to_owned()
        } else {
            std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_owned())
        };
        EnvFilter::try_new(&level).unwrap_or_else(|_| {
            eprintln!("Invalid {LOG_ENV} value '{level}', defaulting to info");
            EnvFilter::new("info")
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn resolve_base_dir(dir: Option<&Path>) -> Result<PathBuf, Box<dyn Error>> {
    let cwd = std::env::current_dir()?;
    let dir = dir.map_or_else(|| cwd.clone(), |d| cwd.join(d));
    dir.canonicalize()
        .map_err(|e| format!("cannot open base directory {}: {e}", dir.display()).into())
}

fn prepare(
    args: &FacadeArgs,
    reader: &dyn ModelReader,
) -> Result<(FacadeConfig, FacadeRequest), Box<dyn Error>> {
    let base_dir = args.base_dir()?;
    if !base_dir.join("pom.xml").is_file() {
        return Err(format!(
            "no pom.xml found in {} — run from a Maven project or pass --dir",
            base_dir.display()
        )
        .into());
    }
    let config = args.load_config(&base_dir)?;
    let request = FacadeRequest::from_config(&config, &base_dir, args.root_dir.as_deref(), reader)?;
    Ok((config, request))
}

fn cmd_package(mode: FacadeMode, args: &FacadeArgs) -> CliResult {
    let reader = PomReader;
    let (config, request) = prepare(args, &reader)?;

    let mvn = facade_mvn::locate_mvn(config.build.mvn.as_deref())?;
    let tool = MavenInvoker::new(&mvn);
    let cwd = std::env::current_dir()?;
    let context = build_context(&config, &cwd, home_dir().as_deref());
    let env = PipelineEnv {
        tool: &tool,
        reader: &reader,
        context: &context,
    };

    let outcome = facade_engine::execute(mode, &request, env)?;

    for file in &outcome.collected {
        let short = file.sha256.get(..12).unwrap_or(&file.sha256);
        eprintln!("   Collected {} ({short})", file.path.display());
    }
    eprintln!(
        "    Finished {} `{}:{}:{}` in {:.2}s ({} dependencies, {} sources)",
        outcome.mode.label(),
        request.group_id,
        request.artifact_id,
        request.version,
        outcome.duration.as_secs_f64(),
        outcome.dependencies.len(),
        outcome.copied_sources
    );
    Ok(())
}

fn cmd_deps(args: &FacadeArgs) -> CliResult {
    let reader = PomReader;
    let (config, request) = prepare(args, &reader)?;

    let mvn = facade_mvn::locate_mvn(config.build.mvn.as_deref())?;
    let tool = MavenInvoker::new(&mvn);
    let cwd = std::env::current_dir()?;
    let context = build_context(&config, &cwd, home_dir().as_deref());
    let env = PipelineEnv {
        tool: &tool,
        reader: &reader,
        context: &context,
    };

    let dependencies = facade_engine::list_dependencies(&request, env)?;
    for dependency in &dependencies {
        println!("{dependency}");
    }
    eprintln!("    {} dependencies", dependencies.len());
    Ok(())
}

fn cmd_doctor(dir: Option<&Path>, mvn: Option<&Path>) -> CliResult {
    eprintln!("Checking environment...");
    eprintln!();

    let mut issues = 0u32;

    let base_dir = resolve_base_dir(dir)?;
    let config_path = base_dir.join(CONFIG_FILE);
    let configured_mvn = if config_path.exists() {
        match FacadeConfig::from_path(&config_path) {
            Ok(config) => {
                eprintln!("  [ok] {CONFIG_FILE}: {}", config_path.display());
                config.build.mvn
            }
            Err(e) => {
                eprintln!("  [!!] {CONFIG_FILE}: {e}");
                issues += 1;
                None
            }
        }
    } else {
        eprintln!("  [--] No {CONFIG_FILE} in {}", base_dir.display());
        None
    };

    match facade_mvn::detect_mvn(mvn.or(configured_mvn.as_deref())) {
        Ok(info) => eprintln!("  [ok] mvn: {} ({})", info.version, info.path.display()),
        Err(e) => {
            eprintln!("  [!!] mvn: {e}");
            issues += 1;
        }
    }

    let base_pom = base_dir.join("pom.xml");
    if base_pom.is_file() {
        match PomReader.read_model(&base_pom) {
            Ok(model) => {
                eprintln!("  [ok] Base project: {}", model.artifact_id);
                let root = facade_engine::modules::discover_root(&base_dir);
                eprintln!("  [ok] Root project: {}", root.display());
            }
            Err(e) => {
                eprintln!("  [!!] Base project: {e}");
                issues += 1;
            }
        }
    } else {
        eprintln!("  [--] No pom.xml in {}", base_dir.display());
    }

    eprintln!();
    if issues > 0 {
        eprintln!("{issues} issue(s) found — fix them before packaging");
        Err(format!("{issues} issue(s) found").into())
    } else {
        eprintln!("All checks passed");
        Ok(())
    }
}
