//! Reserved command-line switches shared by parent and child processes.
//!
//! These are protocol between a test binary and the copies of itself it
//! launches, not options for end users.

/// Run a child process rather than the normal test suite. The value names
/// the function to run: `--client=<function>`.
pub const RUN_CLIENT_PROCESS: &str = "client";

/// Wait for a debugger to attach before running the child function.
pub const DEBUG_ON_START: &str = "debug-on-start";

/// Every switch the spawner owns. They are stripped from an inherited
/// command line before new ones are appended.
pub const RESERVED_SWITCHES: &[&str] = &[RUN_CLIENT_PROCESS, DEBUG_ON_START];
