#![forbid(unsafe_code)]
//! Facade generation for Maven multi-module projects.

pub mod collect;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod invoker;
pub mod modules;
pub mod pipeline;
pub mod sources;
pub mod tree;

pub use descriptor::{FacadeMode, FacadeModuleSpec, License};
pub use error::{EngineError, Stage};
pub use modules::{ModelReader, PomReader};
pub use pipeline::{
    execute, list_dependencies, package_base_dependency, package_facade, FacadeOutcome,
    FacadeRequest, PipelineEnv,
};
