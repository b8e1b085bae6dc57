//! Locating and invoking Maven for the facade pipeline.

pub mod detect;
pub mod error;
pub mod invoke;

pub use detect::{detect_mvn, locate_mvn, MvnInfo};
pub use error::MvnError;
pub use invoke::{BuildContext, BuildTool, InvocationResult, MavenInvoker, MvnCommand};
