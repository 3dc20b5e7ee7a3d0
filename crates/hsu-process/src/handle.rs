//! Handle to a launched process.
//!
//! A [`ProcessHandle`] owns the OS child object. Nothing in this crate waits
//! on it or kills it implicitly: dropping the handle leaves the process
//! running, and reaping it is the owner's job.

use std::process::{Child, ChildStderr, ChildStdout, ExitStatus};
use std::time::{Duration, Instant};

use hsu_common::{ProcessError, ProcessResult};
use tracing::{debug, warn};

use crate::terminate::{force_kill, terminate_gracefully};

/// Interval between exit checks while waiting with a timeout.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    program: String,
    launched_at: Instant,
    exit_status: Option<ExitStatus>,
}

impl ProcessHandle {
    pub fn new(child: Child, program: impl Into<String>) -> Self {
        Self {
            child,
            program: program.into(),
            launched_at: Instant::now(),
            exit_status: None,
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Program the process was launched from.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn launched_at(&self) -> Instant {
        self.launched_at
    }

    /// Exit status if the process has already exited, without blocking.
    pub fn try_wait(&mut self) -> ProcessResult<Option<ExitStatus>> {
        if let Some(status) = self.exit_status {
            return Ok(Some(status));
        }
        let status = self
            .child
            .try_wait()
            .map_err(|e| ProcessError::wait_failed(self.pid().to_string(), e.to_string()))?;
        self.exit_status = status;
        Ok(status)
    }

    /// True while the process has not exited. A failed status query
    /// counts as not running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    /// Blocks until the process exits.
    pub fn wait(&mut self) -> ProcessResult<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }
        let status = self
            .child
            .wait()
            .map_err(|e| ProcessError::wait_failed(self.pid().to_string(), e.to_string()))?;
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Waits up to `timeout` for the process to exit.
    ///
    /// The process is left running when the timeout expires.
    pub fn wait_timeout(&mut self, timeout: Duration) -> ProcessResult<ExitStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(status);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ProcessError::timeout(self.pid().to_string(), "wait"));
            }
            std::thread::sleep(WAIT_POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Async form of [`wait_timeout`](Self::wait_timeout) on the tokio timer.
    pub async fn wait_timeout_async(&mut self, timeout: Duration) -> ProcessResult<ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(status);
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(ProcessError::timeout(self.pid().to_string(), "wait"));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Force kills the process. Succeeds without signalling if it has
    /// already exited.
    pub fn kill(&mut self) -> ProcessResult<()> {
        if self.try_wait()?.is_some() {
            debug!(pid = self.pid(), "Process already exited, nothing to kill");
            return Ok(());
        }
        force_kill(self.pid())
    }

    /// Asks the process to exit (SIGTERM on unix). Succeeds without
    /// signalling if it has already exited.
    pub fn terminate(&mut self) -> ProcessResult<()> {
        if self.try_wait()?.is_some() {
            debug!(pid = self.pid(), "Process already exited, nothing to terminate");
            return Ok(());
        }
        terminate_gracefully(self.pid())
    }

    /// Kills the process and reaps it, logging instead of failing.
    pub fn kill_and_reap(&mut self) {
        if let Err(e) = self.kill() {
            warn!(pid = self.pid(), "Failed to kill process: {}", e);
        }
        if let Err(e) = self.wait() {
            warn!(pid = self.pid(), "Failed to reap process: {}", e);
        }
    }

    /// Captured stdout, when launched with piped stdio.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Captured stderr, when launched with piped stdio.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    pub fn into_child(self) -> Child {
        self.child
    }
}
