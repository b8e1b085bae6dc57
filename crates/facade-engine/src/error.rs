//! Error types for facade-engine.

use std::fmt;

/// A step of the facade pipeline, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    CopySources,
    ResolveModules,
    DependencyTree,
    RenderDescriptor,
    Install,
    CollectOutputs,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prepare => "prepare",
            Self::CopySources => "copy sources",
            Self::ResolveModules => "resolve modules",
            Self::DependencyTree => "dependency tree",
            Self::RenderDescriptor => "render descriptor",
            Self::Install => "install",
            Self::CollectOutputs => "collect outputs",
        })
    }
}

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A filesystem operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] facade_util::error::UtilError),

    /// Locating or starting Maven failed.
    #[error("{0}")]
    Mvn(#[from] facade_mvn::MvnError),

    /// The dependency-tree text is not well formed.
    #[error("malformed dependency tree at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// An internal module's descriptor is missing or unreadable.
    #[error("cannot resolve module `{module}` at {path}: {source}")]
    Resolution {
        module: String,
        path: String,
        source: facade_util::error::UtilError,
    },

    /// A value cannot be written into the generated descriptor.
    #[error("cannot render {field} \"{value}\": {reason}")]
    Render {
        field: String,
        value: String,
        reason: String,
    },

    /// The build tool ran but did not succeed.
    #[error("mvn {goal} {detail}")]
    Invocation { goal: String, detail: String },

    /// An identity field has no configured value and no usable default.
    #[error("cannot determine {field}: {reason}")]
    Identity { field: String, reason: String },

    /// A failure wrapped with the pipeline step it happened in.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Wrap this error with the step it happened in.
    pub fn in_stage(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The outermost step label, if this error carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
