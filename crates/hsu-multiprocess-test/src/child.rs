//! Child side of the spawn protocol.
//!
//! A test binary that spawns children calls [`child_main`] first thing in
//! `main`. When the process was started with `--client=<function>` the
//! named function runs and the process exits with its return value;
//! otherwise `child_main` returns and the normal test suite runs.

use std::path::PathBuf;

use hsu_process::CommandLine;
use tracing::{error, info, warn};

use crate::config::SpawnerConfig;
use crate::debugger::wait_for_debugger;
use crate::dispatch::{ChildRegistry, CHILD_UNKNOWN_FUNCTION_EXIT_CODE};
use crate::logging::init_child_logging;
use crate::switches::{DEBUG_ON_START, RUN_CLIENT_PROCESS};

fn current_command_line() -> CommandLine {
    CommandLine::from_current_process().unwrap_or_else(|_| {
        let mut args = std::env::args_os();
        let program = args.next().map(PathBuf::from).unwrap_or_default();
        CommandLine::from_parts(program, args)
    })
}

/// True when this process was started as a child.
pub fn is_child_process() -> bool {
    current_command_line().has_switch(RUN_CLIENT_PROCESS)
}

/// Function this process was asked to run, if it is a child.
pub fn child_function_name() -> Option<String> {
    current_command_line()
        .switch_value(RUN_CLIENT_PROCESS)
        .map(str::to_string)
}

/// True when the parent asked this child to wait for a debugger.
pub fn debug_on_start_requested() -> bool {
    current_command_line().has_switch(DEBUG_ON_START)
}

/// Runs the requested child function, if any, and returns its exit code.
///
/// Returns `None` when `command_line` carries no `--client` switch.
pub fn run_child_from(
    registry: &ChildRegistry,
    command_line: &CommandLine,
    config: &SpawnerConfig,
) -> Option<i32> {
    let function = command_line.switch_value(RUN_CLIENT_PROCESS)?;

    init_child_logging(&config.child_log_level);
    info!(function, pid = std::process::id(), "Running as child process");

    if command_line.has_switch(DEBUG_ON_START) {
        wait_for_debugger(config.debugger_wait_timeout);
    }

    match registry.run(function) {
        Ok(code) => {
            info!(function, code, "Child function finished");
            Some(code)
        }
        Err(e) => {
            let known: Vec<_> = registry.names().map(|name| name.as_str()).collect();
            error!(function, "{}; registered functions: {:?}", e, known);
            Some(CHILD_UNKNOWN_FUNCTION_EXIT_CODE)
        }
    }
}

/// [`run_child_from`] with the current process command line and the
/// configuration the parent forwarded through the environment.
pub fn run_child_if_requested(registry: &ChildRegistry) -> Option<i32> {
    let command_line = current_command_line();
    if !command_line.has_switch(RUN_CLIENT_PROCESS) {
        return None;
    }

    let config = SpawnerConfig::from_env().unwrap_or_else(|e| {
        let config = SpawnerConfig::default();
        init_child_logging(&config.child_log_level);
        warn!("Ignoring invalid child configuration: {:#}", e);
        config
    });

    run_child_from(registry, &command_line, &config)
}

/// Exits the process with the child function's exit code when started as
/// a child; returns otherwise.
pub fn child_main(registry: &ChildRegistry) {
    if let Some(code) = run_child_if_requested(registry) {
        std::process::exit(code);
    }
}
