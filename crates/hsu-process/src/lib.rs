//! # HSU Process
//!
//! Low-level process operations for the HSU multiprocess test crates.
//!
//! This crate provides cross-platform primitives for:
//! - Command-line construction, switch parsing and Windows serialization
//! - Process launching behind the [`ProcessLauncher`] trait
//! - Waiting on, killing and terminating launched processes
//! - Process existence checks
//! - Validation of launch inputs

pub mod check;
pub mod command_line;
pub mod handle;
pub mod launch;
pub mod terminate;
pub mod validation;

#[cfg(unix)]
pub mod launch_unix;

#[cfg(windows)]
pub mod launch_windows;

// Re-export main types
pub use check::*;
pub use command_line::*;
pub use handle::*;
pub use launch::*;
pub use terminate::*;
pub use validation::*;

#[cfg(unix)]
pub use launch_unix::PosixLauncher;

#[cfg(windows)]
pub use launch_windows::WindowsLauncher;
