//! Error types for facade-mvn.

use std::path::PathBuf;

/// Errors produced by Maven detection and invocation.
#[derive(Debug, thiserror::Error)]
pub enum MvnError {
    /// mvn was not found on the system.
    #[error("mvn not found — install Maven and add it to PATH, or set MAVEN_HOME")]
    NotFound,

    /// An explicitly configured mvn path does not exist.
    #[error("mvn not found at {path} — check build.mvn in facade.toml or --mvn")]
    ConfiguredNotFound { path: PathBuf },

    /// mvn was found but is not executable.
    #[error("mvn found at {path} but is not executable — check file permissions")]
    NotExecutable { path: PathBuf },

    /// Failed to execute mvn.
    #[error("cannot execute mvn: {source}")]
    Exec { source: std::io::Error },

    /// `mvn -v` returned an unexpected format.
    #[error("cannot parse Maven version from output: {output}")]
    VersionParse { output: String },

    /// No descriptor path was set on the command.
    #[error("no pom.xml specified for the Maven invocation")]
    NoPom,

    /// No goals were set on the command.
    #[error("no goals specified for the Maven invocation")]
    NoGoals,

    /// An error propagated from facade-util.
    #[error("{0}")]
    Util(#[from] facade_util::error::UtilError),
}
