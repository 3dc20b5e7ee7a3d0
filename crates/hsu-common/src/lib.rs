//! # HSU Common
//!
//! Common types shared by the HSU multiprocess test crates.
//!
//! This crate provides the error types and small domain types that the
//! process primitives (`hsu-process`) and the multiprocess test helper
//! (`hsu-multiprocess-test`) build upon.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{Error, ProcessError, ProcessResult, Result, ResultExt};
pub use types::FunctionName;
