//! Tracing setup for parent and child test processes.

use tracing_subscriber::EnvFilter;

use crate::config::ENV_LOG;

/// Install a stderr `fmt` subscriber for a child process.
///
/// The filter comes from `HSU_MPT_LOG`, then `RUST_LOG`, then `level`.
/// Returns false if a global subscriber was already installed.
pub fn init_child_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .try_init()
        .is_ok()
}

/// Install a subscriber for the parent test process, honouring `RUST_LOG`
/// and defaulting to warnings only.
pub fn init_test_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init()
        .is_ok()
}
