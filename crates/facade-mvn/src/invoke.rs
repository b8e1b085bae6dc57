//! Maven invocation.
//!
//! [`MvnCommand`] describes one run of the build tool; [`BuildTool`] is the
//! seam the pipeline talks to, so tests can substitute a fake for a real
//! Maven installation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use facade_util::process::{run_command, run_command_attached};

use crate::error::MvnError;

/// Ambient settings forwarded to every Maven run.
///
/// Built once from configuration and flags, then passed explicitly to each
/// invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    /// Whether Maven may prompt; when false the run uses batch mode (`-B`).
    pub interactive: bool,
    /// Profiles to activate (`-P`).
    pub profiles: Vec<String>,
    /// User settings file (`-s`), forwarded only if it exists on disk.
    pub user_settings: Option<PathBuf>,
    /// Global settings file (`-gs`), forwarded only if it exists on disk.
    pub global_settings: Option<PathBuf>,
    /// User properties appended as `-Dkey=value`.
    pub properties: BTreeMap<String, String>,
}

impl BuildContext {
    /// Make the settings paths absolute.
    ///
    /// Maven runs in the descriptor's directory, so a relative path would be
    /// resolved against the wrong place. A leading `~` expands to `home`;
    /// other relative paths are joined onto `cwd`.
    #[must_use]
    pub fn anchored(mut self, cwd: &Path, home: Option<&Path>) -> Self {
        self.user_settings = self.user_settings.map(|p| anchor(&p, cwd, home));
        self.global_settings = self.global_settings.map(|p| anchor(&p, cwd, home));
        self
    }
}

fn anchor(path: &Path, cwd: &Path, home: Option<&Path>) -> PathBuf {
    if let (Ok(rest), Some(home)) = (path.strip_prefix("~"), home) {
        return home.join(rest);
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Builder for one Maven invocation.
#[derive(Debug, Clone, Default)]
pub struct MvnCommand {
    pom: Option<PathBuf>,
    goals: Vec<String>,
    context: BuildContext,
}

impl MvnCommand {
    /// Create a new empty command builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the descriptor to build (`-f`).
    pub fn pom(mut self, path: &Path) -> Self {
        self.pom = Some(path.to_path_buf());
        self
    }

    /// Append a goal or goal argument.
    pub fn goal(mut self, goal: &str) -> Self {
        self.goals.push(goal.to_owned());
        self
    }

    /// Set the ambient context.
    pub fn context(mut self, context: &BuildContext) -> Self {
        self.context = context.clone();
        self
    }

    /// Whether the run may prompt on the terminal.
    pub fn is_interactive(&self) -> bool {
        self.context.interactive
    }

    /// The descriptor path, if set.
    pub fn pom_path(&self) -> Option<&Path> {
        self.pom.as_deref()
    }

    /// The goals in order, without the appended properties.
    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    /// Build the argument list without executing.
    ///
    /// # Errors
    /// Returns an error if the descriptor or goals are not set.
    pub fn build_args(&self) -> Result<Vec<String>, MvnError> {
        let Some(pom) = &self.pom else {
            return Err(MvnError::NoPom);
        };
        if self.goals.is_empty() {
            return Err(MvnError::NoGoals);
        }

        let mut args = vec!["-f".to_owned(), pom.display().to_string()];

        if !self.context.interactive {
            args.push("-B".to_owned());
        }

        if !self.context.profiles.is_empty() {
            args.push("-P".to_owned());
            args.push(self.context.profiles.join(","));
        }

        // Settings files that do not exist are dropped rather than failing the run.
        if let Some(user) = self.context.user_settings.as_ref().filter(|p| p.is_file()) {
            args.push("-s".to_owned());
            args.push(user.display().to_string());
        }
        if let Some(global) = self.context.global_settings.as_ref().filter(|p| p.is_file()) {
            args.push("-gs".to_owned());
            args.push(global.display().to_string());
        }

        args.extend(self.goals.iter().cloned());

        for (key, value) in &self.context.properties {
            args.push(format!("-D{key}={value}"));
        }

        Ok(args)
    }
}

/// Result of one build-tool run.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
    /// What the tool reported as the cause of failure, if anything.
    pub execution_error: Option<String>,
}

impl InvocationResult {
    /// Whether the run exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// One-line summary for error messages and logs.
    pub fn summary(&self) -> String {
        match (self.exit_code, &self.execution_error) {
            (Some(0), _) => "succeeded".to_owned(),
            (Some(code), Some(cause)) => format!("exited with code {code}: {cause}"),
            (Some(code), None) => format!("exited with code {code}"),
            (None, Some(cause)) => format!("was terminated by a signal: {cause}"),
            (None, None) => "was terminated by a signal".to_owned(),
        }
    }
}

/// The external build tool, seen as a black box.
pub trait BuildTool {
    /// Run one invocation to completion.
    ///
    /// A non-zero exit is reported through [`InvocationResult`], not as an error.
    ///
    /// # Errors
    /// Returns an error if the command is incomplete or the tool cannot be started.
    fn invoke(&self, command: &MvnCommand) -> Result<InvocationResult, MvnError>;
}

/// [`BuildTool`] backed by a real `mvn` subprocess.
#[derive(Debug, Clone)]
pub struct MavenInvoker {
    mvn: PathBuf,
}

impl MavenInvoker {
    /// Use the launcher at `mvn`.
    pub fn new(mvn: &Path) -> Self {
        Self {
            mvn: mvn.to_path_buf(),
        }
    }
}

impl BuildTool for MavenInvoker {
    fn invoke(&self, command: &MvnCommand) -> Result<InvocationResult, MvnError> {
        let args = command.build_args()?;
        tracing::info!("execute 'mvn {}'", args.join(" "));

        let mut cmd = Command::new(&self.mvn);
        cmd.args(&args);
        if let Some(dir) = command.pom_path().and_then(Path::parent) {
            if !dir.as_os_str().is_empty() {
                cmd.current_dir(dir);
            }
        }

        // Interactive runs share the terminal, so nothing is captured.
        let output = if command.is_interactive() {
            run_command_attached(&mut cmd)?
        } else {
            run_command(&mut cmd)?
        };

        let execution_error = if output.success {
            None
        } else {
            tracing::debug!("mvn stdout:\n{}", output.stdout);
            let errors = output.lines_with_marker("[ERROR]");
            if errors.is_empty() {
                output
                    .stderr
                    .lines()
                    .map(str::trim)
                    .rfind(|line| !line.is_empty())
                    .map(str::to_owned)
            } else {
                Some(errors.join("; "))
            }
        };

        Ok(InvocationResult {
            exit_code: output.exit_code,
            execution_error,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn context() -> BuildContext {
        BuildContext::default()
    }

    #[test]
    fn build_args_basic() {
        let cmd = MvnCommand::new()
            .pom(Path::new("/work/facade/pom.xml"))
            .goal("install")
            .context(&context());

        assert_eq!(
            cmd.build_args().unwrap(),
            vec!["-f", "/work/facade/pom.xml", "-B", "install"]
        );
    }

    #[test]
    fn build_args_interactive_drops_batch_flag() {
        let ctx = BuildContext {
            interactive: true,
            ..context()
        };
        let cmd = MvnCommand::new()
            .pom(Path::new("pom.xml"))
            .goal("install")
            .context(&ctx);

        assert!(!cmd.build_args().unwrap().contains(&"-B".to_owned()));
    }

    #[test]
    fn build_args_profiles_and_properties() {
        let mut ctx = context();
        ctx.profiles = vec!["release".to_owned(), "ci".to_owned()];
        ctx.properties.insert("skipTests".to_owned(), "true".to_owned());
        ctx.properties.insert("maven.repo.local".to_owned(), "/m2".to_owned());

        let cmd = MvnCommand::new()
            .pom(Path::new("pom.xml"))
            .goal("dependency:tree")
            .goal("-DoutputFile=/tmp/deps.log.1")
            .context(&ctx);

        assert_eq!(
            cmd.build_args().unwrap(),
            vec![
                "-f",
                "pom.xml",
                "-B",
                "-P",
                "release,ci",
                "dependency:tree",
                "-DoutputFile=/tmp/deps.log.1",
                "-Dmaven.repo.local=/m2",
                "-DskipTests=true",
            ]
        );
    }

    #[test]
    fn build_args_only_forwards_existing_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let user = tmp.path().join("settings.xml");
        std::fs::write(&user, b"<settings/>").unwrap();

        let ctx = BuildContext {
            user_settings: Some(user.clone()),
            global_settings: Some(tmp.path().join("missing.xml")),
            ..context()
        };
        let args = MvnCommand::new()
            .pom(Path::new("pom.xml"))
            .goal("install")
            .context(&ctx)
            .build_args()
            .unwrap();

        assert!(args.contains(&"-s".to_owned()));
        assert!(args.contains(&user.display().to_string()));
        assert!(!args.contains(&"-gs".to_owned()));
    }

    #[test]
    fn build_args_requires_pom_and_goals() {
        assert!(matches!(
            MvnCommand::new().goal("install").build_args(),
            Err(MvnError::NoPom)
        ));
        assert!(matches!(
            MvnCommand::new().pom(Path::new("pom.xml")).build_args(),
            Err(MvnError::NoGoals)
        ));
    }

    #[test]
    fn summary_includes_cause() {
        let result = InvocationResult {
            exit_code: Some(1),
            execution_error: Some("Failed to execute goal".to_owned()),
        };
        assert!(!result.success());
        assert_eq!(result.summary(), "exited with code 1: Failed to execute goal");
    }

    #[cfg(unix)]
    #[test]
    fn maven_invoker_captures_failure() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let fake = tmp.path().join("mvn");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho \"[INFO] Scanning for projects...\"\necho \"[ERROR] Failed to execute goal $*\"\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let pom = tmp.path().join("pom.xml");
        let cmd = MvnCommand::new().pom(&pom).goal("install").context(&context());
        let result = MavenInvoker::new(&fake).invoke(&cmd).unwrap();

        assert_eq!(result.exit_code, Some(1));
        let expected = format!("Failed to execute goal -f {} -B install", pom.display());
        assert_eq!(result.execution_error.as_deref(), Some(expected.as_str()));
    }

    #[cfg(unix)]
    #[test]
    fn maven_invoker_falls_back_to_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let fake = tmp.path().join("mvn");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho \"The JAVA_HOME environment variable is not defined correctly\" >&2\necho >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cmd = MvnCommand::new()
            .pom(&tmp.path().join("pom.xml"))
            .goal("install")
            .context(&context());
        let result = MavenInvoker::new(&fake).invoke(&cmd).unwrap();

        assert_eq!(
            result.summary(),
            "exited with code 1: The JAVA_HOME environment variable is not defined correctly"
        );
    }

    #[test]
    fn anchored_joins_relative_settings_onto_cwd() {
        let ctx = BuildContext {
            user_settings: Some(PathBuf::from("settings.xml")),
            global_settings: Some(PathBuf::from("/etc/maven/settings.xml")),
            ..context()
        }
        .anchored(Path::new("/home/dev/project"), None);

        assert_eq!(
            ctx.user_settings,
            Some(PathBuf::from("/home/dev/project/settings.xml"))
        );
        assert_eq!(
            ctx.global_settings,
            Some(PathBuf::from("/etc/maven/settings.xml"))
        );
    }

    #[test]
    fn anchored_expands_home() {
        let ctx = BuildContext {
            user_settings: Some(PathBuf::from("~/.m2/settings.xml")),
            global_settings: Some(PathBuf::from("~weird/settings.xml")),
            ..context()
        }
        .anchored(Path::new("/work"), Some(Path::new("/home/dev")));

        assert_eq!(
            ctx.user_settings,
            Some(PathBuf::from("/home/dev/.m2/settings.xml"))
        );
        assert_eq!(
            ctx.global_settings,
            Some(PathBuf::from("/work/~weird/settings.xml"))
        );
    }

    #[test]
    fn build_args_forwards_home_relative_settings_once_anchored() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join(".m2")).unwrap();
        let settings = home.path().join(".m2/settings.xml");
        std::fs::write(&settings, b"<settings/>").unwrap();

        let ctx = BuildContext {
            user_settings: Some(PathBuf::from("~/.m2/settings.xml")),
            ..context()
        }
        .anchored(Path::new("/work"), Some(home.path()));
        let args = MvnCommand::new()
            .pom(Path::new("/w/pom.xml"))
            .goal("install")
            .context(&ctx)
            .build_args()
            .unwrap();

        assert_eq!(
            args,
            vec![
                "-f".to_owned(),
                "/w/pom.xml".to_owned(),
                "-B".to_owned(),
                "-s".to_owned(),
                settings.display().to_string(),
                "install".to_owned(),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_settings_resolve_from_caller_not_descriptor_dir() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let caller = tmp.path().join("caller");
        let work = tmp.path().join("base/acme-facade");
        std::fs::create_dir_all(&caller).unwrap();
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(caller.join("settings.xml"), b"<settings/>").unwrap();

        // Resolves -s against its own working directory, as Maven does.
        let fake = tmp.path().join("mvn");
        std::fs::write(
            &fake,
            concat!(
                "#!/bin/sh\n",
                "found=0\n",
                "while [ $# -gt 0 ]; do\n",
                "  if [ \"$1\" = \"-s\" ]; then\n",
                "    [ -f \"$2\" ] || { echo \"[ERROR] The specified user settings file does not exist: $2\"; exit 1; }\n",
                "    found=1\n",
                "  fi\n",
                "  shift\n",
                "done\n",
                "[ $found = 1 ] || { echo \"[ERROR] no user settings given\"; exit 1; }\n",
            ),
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = BuildContext {
            user_settings: Some(PathBuf::from("settings.xml")),
            ..context()
        }
        .anchored(&caller, None);
        let cmd = MvnCommand::new()
            .pom(&work.join("pom.xml"))
            .goal("install")
            .context(&ctx);
        let result = MavenInvoker::new(&fake).invoke(&cmd).unwrap();

        assert!(result.success(), "{}", result.summary());
    }
}
