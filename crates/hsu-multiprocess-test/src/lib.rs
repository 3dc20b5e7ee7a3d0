//! # HSU Multiprocess Test
//!
//! Helpers for tests that need code running in another process.
//!
//! The parent test launches a copy of its own binary with a reserved
//! `--client=<function>` switch. The copy recognizes the switch at the top
//! of `main`, looks the function up in a [`ChildRegistry`] and runs it
//! instead of the test suite; its return value becomes the exit code.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use hsu_multiprocess_test::{child_main, ChildProcessSpawner, ChildRegistry};
//!
//! fn echo_function() -> i32 {
//!     0
//! }
//!
//! fn main() {
//!     let registry = ChildRegistry::new()
//!         .with("EchoFunction", echo_function)
//!         .expect("valid child registry");
//!     child_main(&registry);
//!
//!     // Normal test code from here on.
//!     let mut child = ChildProcessSpawner::new()
//!         .spawn_child("EchoFunction")
//!         .expect("child launched");
//!     let status = child.wait_timeout(Duration::from_secs(30)).expect("child exited");
//!     assert_eq!(status.code(), Some(0));
//! }
//! ```
//!
//! Test binaries built by libtest reject unknown switches, so a test that
//! spawns children uses `harness = false` and its own `main`.

pub mod child;
pub mod config;
pub mod debugger;
pub mod dispatch;
pub mod logging;
pub mod spawner;
pub mod switches;

pub use child::{
    child_function_name, child_main, debug_on_start_requested, is_child_process, run_child_from,
    run_child_if_requested,
};
pub use config::SpawnerConfig;
pub use dispatch::{ChildFn, ChildRegistry, CHILD_PANIC_EXIT_CODE, CHILD_UNKNOWN_FUNCTION_EXIT_CODE};
pub use logging::{init_child_logging, init_test_logging};
pub use spawner::{ChildProcessSpawner, LaunchRequest};
pub use switches::{DEBUG_ON_START, RUN_CLIENT_PROCESS};

pub use hsu_common::{Error, FunctionName, ProcessError, ProcessResult, Result};
pub use hsu_process::{CommandLine, LaunchOptions, ProcessHandle, ProcessLauncher, StdioMode};
