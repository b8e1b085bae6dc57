//! Process execution helpers.

use std::process::{Command, Stdio};

use crate::error::UtilError;

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct CommandOutput {
    /// Standard output as a string.
    pub stdout: String,
    /// Standard error as a string.
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Lines from stdout and stderr that start with `marker`, marker stripped.
    ///
    /// Maven reports failures as `[ERROR] ...` lines on stdout.
    pub fn lines_with_marker(&self, marker: &str) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .filter_map(|line| line.trim_start().strip_prefix(marker))
            .map(|rest| rest.trim().to_owned())
            .filter(|rest| !rest.is_empty())
            .collect()
    }
}

/// Execute a command and capture its output.
///
/// # Errors
/// Returns an error if the command cannot be spawned (e.g. binary not found).
/// A non-zero exit code is **not** an error; check `CommandOutput::success` instead.
pub fn run_command(cmd: &mut Command) -> Result<CommandOutput, UtilError> {
    let output = cmd
        .output()
        .map_err(|source| UtilError::CommandExec { source })?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        exit_code: output.status.code(),
    })
}

/// Execute a command on the caller's terminal.
///
/// The child inherits stdin, stdout and stderr, so it can prompt and its
/// progress shows as it happens. The returned output streams are empty.
///
/// # Errors
/// Returns an error if the command cannot be spawned.
pub fn run_command_attached(cmd: &mut Command) -> Result<CommandOutput, UtilError> {
    let status = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| UtilError::CommandExec { source })?;

    Ok(CommandOutput {
        stdout: String::new(),
        stderr: String::new(),
        success: status.success(),
        exit_code: status.code(),
    })
}
