//! POSIX process launching.
//!
//! The argument vector is handed to the OS as-is; no string serialization
//! or shell is involved.

use hsu_common::ProcessResult;

use crate::command_line::CommandLine;
use crate::handle::ProcessHandle;
use crate::launch::{prepare_command, spawn_prepared, LaunchOptions, ProcessLauncher};

#[derive(Debug, Clone, Copy, Default)]
pub struct PosixLauncher;

impl ProcessLauncher for PosixLauncher {
    fn launch(
        &self,
        command_line: &CommandLine,
        options: &LaunchOptions,
    ) -> ProcessResult<ProcessHandle> {
        let mut command = prepare_command(command_line, options)?;
        command.args(command_line.args());
        spawn_prepared(command, command_line, options, self.name())
    }

    fn name(&self) -> &'static str {
        "posix"
    }
}
