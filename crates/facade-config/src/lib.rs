//! Parse and validate `facade.toml`.

pub mod config;

pub use config::{ConfigError, FacadeConfig};
