#![forbid(unsafe_code)]
//! Filesystem, hashing, process, and Maven model helpers for the facade tool.

pub mod error;
pub mod fs;
pub mod hash;
pub mod maven;
pub mod pom;
pub mod process;
