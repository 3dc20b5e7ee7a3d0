//! Windows process launching.
//!
//! Windows processes receive a single command-line string and split it
//! themselves, so the argument vector is serialized with
//! [`CommandLine::arguments_wide`] and passed through verbatim.

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::os::windows::process::CommandExt;

use hsu_common::ProcessResult;
use windows::Win32::System::Threading::CREATE_NO_WINDOW;

use crate::command_line::CommandLine;
use crate::handle::ProcessHandle;
use crate::launch::{prepare_command, spawn_prepared, LaunchOptions, ProcessLauncher};

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsLauncher;

impl ProcessLauncher for WindowsLauncher {
    fn launch(
        &self,
        command_line: &CommandLine,
        options: &LaunchOptions,
    ) -> ProcessResult<ProcessHandle> {
        let mut command = prepare_command(command_line, options)?;

        let arguments = command_line.arguments_wide();
        if !arguments.is_empty() {
            command.raw_arg(OsString::from_wide(&arguments));
        }

        if options.start_hidden {
            command.creation_flags(CREATE_NO_WINDOW.0);
        }

        spawn_prepared(command, command_line, options, self.name())
    }

    fn name(&self) -> &'static str {
        "windows"
    }
}
