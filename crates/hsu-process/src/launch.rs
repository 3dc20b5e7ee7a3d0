//! Process launching.
//!
//! [`ProcessLauncher`] is the seam between "what to run" and "how the
//! platform starts it". Each platform has one implementation
//! ([`PosixLauncher`](crate::PosixLauncher) on unix,
//! [`WindowsLauncher`](crate::WindowsLauncher) on Windows) and
//! [`PlatformLauncher`] names the one compiled for the current target.
//! Tests substitute their own implementation to inject failures.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use hsu_common::{ProcessError, ProcessResult};
use tracing::debug;

use crate::command_line::CommandLine;
use crate::handle::ProcessHandle;
use crate::validation::validate_executable;

/// Where the child's standard streams go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdioMode {
    /// Share the parent's stdin, stdout and stderr.
    #[default]
    Inherit,
    /// Connect all three to the null device.
    Null,
    /// Capture stdout and stderr through pipes; stdin is null.
    Piped,
}

/// Options applied to a single launch.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Block until the child exits before returning its handle.
    pub wait: bool,

    /// Start without a visible console window (Windows only).
    pub start_hidden: bool,

    pub stdio: StdioMode,

    /// Extra environment variables, added on top of the inherited ones.
    pub environment: Vec<(String, String)>,

    pub current_dir: Option<PathBuf>,
}

impl LaunchOptions {
    /// Fire-and-forget launch, visible and running immediately.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_start_hidden(mut self, start_hidden: bool) -> Self {
        self.start_hidden = start_hidden;
        self
    }

    pub fn with_stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

/// Starts a process from a command line.
pub trait ProcessLauncher: Send + Sync {
    /// Start `command_line` as a new process.
    ///
    /// Returns as soon as the OS has created the process unless
    /// `options.wait` is set.
    fn launch(
        &self,
        command_line: &CommandLine,
        options: &LaunchOptions,
    ) -> ProcessResult<ProcessHandle>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for Arc<L> {
    fn launch(
        &self,
        command_line: &CommandLine,
        options: &LaunchOptions,
    ) -> ProcessResult<ProcessHandle> {
        (**self).launch(command_line, options)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for Box<L> {
    fn launch(
        &self,
        command_line: &CommandLine,
        options: &LaunchOptions,
    ) -> ProcessResult<ProcessHandle> {
        (**self).launch(command_line, options)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(unix)]
pub type PlatformLauncher = crate::launch_unix::PosixLauncher;

#[cfg(windows)]
pub type PlatformLauncher = crate::launch_windows::WindowsLauncher;

/// Launcher for the current target platform.
pub fn default_launcher() -> Arc<dyn ProcessLauncher> {
    Arc::new(PlatformLauncher::default())
}

/// Builds a `Command` with the platform-independent options applied.
///
/// Program and arguments are left to the caller because that is where the
/// platforms differ.
pub(crate) fn prepare_command(
    command_line: &CommandLine,
    options: &LaunchOptions,
) -> ProcessResult<Command> {
    let program = command_line.program();
    validate_executable(program)?;

    let mut command = Command::new(program);

    match options.stdio {
        StdioMode::Inherit => {}
        StdioMode::Null => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
        StdioMode::Piped => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }
    }

    for (key, value) in &options.environment {
        command.env(key, value);
    }

    if let Some(dir) = &options.current_dir {
        command.current_dir(dir);
    }

    Ok(command)
}

/// Spawns a prepared command and applies the `wait` option.
pub(crate) fn spawn_prepared(
    mut command: Command,
    command_line: &CommandLine,
    options: &LaunchOptions,
    launcher: &'static str,
) -> ProcessResult<ProcessHandle> {
    let program = command_line.program().display().to_string();
    debug!(launcher, program = %program, "Launching: {}", command_line);

    let child = command
        .spawn()
        .map_err(|e| ProcessError::spawn_failed(&program, &e))?;

    let mut handle = ProcessHandle::new(child, program);
    debug!(launcher, pid = handle.pid(), "Launched process {}", handle.program());

    if options.wait {
        let status = handle.wait()?;
        debug!(pid = handle.pid(), "Process exited with {}", status);
    }

    Ok(handle)
}
