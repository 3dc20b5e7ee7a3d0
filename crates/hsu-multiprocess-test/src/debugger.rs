//! Pausing a child process until a debugger attaches.

use std::time::{Duration, Instant};

use tracing::{info, warn};

pub const DEBUGGER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Whether a debugger is attached to this process, or `None` where the
/// platform gives no cheap way to tell.
pub fn debugger_attached() -> Option<bool> {
    #[cfg(target_os = "linux")]
    {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_tracer_pid(&status).map(|pid| pid != 0)
    }

    #[cfg(windows)]
    {
        use windows::Win32::System::Diagnostics::Debug::IsDebuggerPresent;

        // SAFETY: no arguments, only reads the PEB of this process.
        Some(unsafe { IsDebuggerPresent() }.as_bool())
    }

    #[cfg(not(any(target_os = "linux", windows)))]
    {
        None
    }
}

/// `TracerPid` field of a `/proc/<pid>/status` document.
pub fn parse_tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|value| value.trim().parse().ok())
}

/// Blocks until a debugger attaches or `timeout` elapses.
///
/// Where attachment cannot be detected the full timeout is slept, which
/// still leaves a window to attach by pid. Returns true if a debugger was
/// seen.
pub fn wait_for_debugger(timeout: Duration) -> bool {
    let pid = std::process::id();
    let deadline = Instant::now() + timeout;

    if debugger_attached().is_none() {
        warn!(pid, "Cannot detect debugger attachment on this platform, pausing for {:?}", timeout);
        std::thread::sleep(timeout);
        return false;
    }

    info!(pid, "Waiting up to {:?} for a debugger to attach", timeout);
    loop {
        if debugger_attached() == Some(true) {
            info!(pid, "Debugger attached");
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            warn!(pid, "No debugger attached within {:?}, continuing", timeout);
            return false;
        }
        std::thread::sleep(DEBUGGER_POLL_INTERVAL.min(deadline - now));
    }
}
