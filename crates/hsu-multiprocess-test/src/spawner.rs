//! Launching child processes that run a named function.
//!
//! [`ChildProcessSpawner`] re-invokes the current test binary with
//! `--client=<function>` (and optionally `--debug-on-start`) and returns the
//! handle of the new process. The child side of the protocol lives in
//! [`crate::child`].

use std::fmt;
use std::sync::Arc;

use hsu_common::{Error, FunctionName, Result, ResultExt};
use hsu_process::{
    default_launcher, validate_function_name, CommandLine, LaunchOptions, ProcessHandle,
    ProcessLauncher, StdioMode,
};
use tracing::{debug, info, warn};

use crate::config::SpawnerConfig;
use crate::switches::{DEBUG_ON_START, RESERVED_SWITCHES, RUN_CLIENT_PROCESS};

/// One request to start a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub function_name: FunctionName,
    pub debug_on_start: bool,
}

impl LaunchRequest {
    pub fn new(function_name: impl Into<FunctionName>) -> Self {
        Self {
            function_name: function_name.into(),
            debug_on_start: false,
        }
    }

    pub fn with_debug_on_start(mut self, debug_on_start: bool) -> Self {
        self.debug_on_start = debug_on_start;
        self
    }
}

#[derive(Clone)]
pub struct ChildProcessSpawner {
    launcher: Arc<dyn ProcessLauncher>,
    base_command_line: Option<CommandLine>,
    config: SpawnerConfig,
}

impl fmt::Debug for ChildProcessSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildProcessSpawner")
            .field("launcher", &self.launcher.name())
            .field("base_command_line", &self.base_command_line)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for ChildProcessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildProcessSpawner {
    /// Spawner using the platform launcher, the current process command
    /// line and default configuration.
    pub fn new() -> Self {
        Self {
            launcher: default_launcher(),
            base_command_line: None,
            config: SpawnerConfig::default(),
        }
    }

    /// Spawner configured from the `HSU_MPT_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new().with_config(SpawnerConfig::from_env()?))
    }

    pub fn with_launcher(self, launcher: impl ProcessLauncher + 'static) -> Self {
        self.with_shared_launcher(Arc::new(launcher))
    }

    pub fn with_shared_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Use `command_line` instead of the current process invocation as the
    /// base every child command line is built from.
    pub fn with_base_command_line(mut self, command_line: CommandLine) -> Self {
        self.base_command_line = Some(command_line);
        self
    }

    pub fn with_config(mut self, config: SpawnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn launcher_name(&self) -> &'static str {
        self.launcher.name()
    }

    /// Run `function_name` in a new child process.
    pub fn spawn_child(&self, function_name: &str) -> Result<ProcessHandle> {
        self.spawn_child_with_options(function_name, false)
    }

    /// Run `function_name` in a new child process, optionally asking the
    /// child to wait for a debugger before it starts.
    ///
    /// Success means the OS created the process, not that the child found
    /// or finished its function.
    pub fn spawn_child_with_options(
        &self,
        function_name: &str,
        debug_on_start: bool,
    ) -> Result<ProcessHandle> {
        self.spawn(&LaunchRequest::new(function_name).with_debug_on_start(debug_on_start))
    }

    pub fn spawn(&self, request: &LaunchRequest) -> Result<ProcessHandle> {
        let function = request.function_name.as_str();
        let command_line = self.build_command_line(function, request.debug_on_start)?;
        let options = self.launch_options();

        let handle = self.launcher.launch(&command_line, &options).map_err(|e| {
            warn!(function, launcher = self.launcher.name(), "Failed to spawn child: {}", e);
            Error::from(e)
        })?;

        info!(
            function,
            pid = handle.pid(),
            debug_on_start = request.debug_on_start,
            "Spawned child process"
        );
        Ok(handle)
    }

    /// Command line a child for `function_name` would be started with.
    ///
    /// The reserved switches go after the inherited switches and ahead of a
    /// `--` terminator, so the child always sees them.
    pub fn build_command_line(
        &self,
        function_name: &str,
        debug_on_start: bool,
    ) -> Result<CommandLine> {
        validate_function_name(function_name)?;

        let mut command_line = self.base_command_line()?;
        command_line.append_switch_with_value(RUN_CLIENT_PROCESS, function_name);
        if debug_on_start {
            command_line.append_switch(DEBUG_ON_START);
        }

        debug!(function = function_name, "Child command line: {}", command_line);
        Ok(command_line)
    }

    /// Options for every launch: fire-and-forget, visible, running, with
    /// the configuration forwarded through the environment.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            wait: false,
            start_hidden: false,
            stdio: if self.config.capture_output {
                StdioMode::Piped
            } else {
                StdioMode::Inherit
            },
            environment: self.config.child_environment(),
            current_dir: None,
        }
    }

    /// Base invocation with any reserved switches removed, so a child
    /// spawning its own children does not pass its `--client` along.
    fn base_command_line(&self) -> Result<CommandLine> {
        let mut command_line = match &self.base_command_line {
            Some(command_line) => command_line.clone(),
            None => CommandLine::from_current_process()
                .map_err(Error::from)
                .context("Failed to determine the current process command line")?,
        };

        for switch in RESERVED_SWITCHES {
            command_line.remove_switch(switch);
        }
        Ok(command_line)
    }
}
