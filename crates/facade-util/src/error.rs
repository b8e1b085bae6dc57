//! Error types for facade-util.

/// Errors produced by utility functions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// An I/O operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A glob pattern was invalid.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    GlobPattern { pattern: String, message: String },

    /// A command failed to execute.
    #[error("cannot execute command: {source}")]
    CommandExec { source: std::io::Error },

    /// A Maven coordinate string is malformed.
    #[error("invalid Maven coordinate \"{coordinate}\": {reason}")]
    InvalidMavenCoordinate { coordinate: String, reason: String },

    /// A directory walk exceeded its entry budget.
    #[error("directory walk under {root} exceeded {limit} entries")]
    WalkLimit { root: String, limit: usize },

    /// A POM file could not be parsed.
    #[error("invalid POM at {path}: {message}")]
    InvalidPom { path: String, message: String },

    /// A POM file has no `<artifactId>` of its own.
    #[error("POM at {path} declares no artifactId")]
    MissingArtifactId { path: String },
}
