//! Process termination primitives.

use hsu_common::{ProcessError, ProcessResult};
use tracing::debug;

use crate::check::process_exists;

fn ensure_exists(pid: u32) -> ProcessResult<()> {
    if process_exists(pid)? {
        Ok(())
    } else {
        Err(ProcessError::not_found(pid.to_string()))
    }
}

/// Ask a process to exit (SIGTERM on Unix).
///
/// Windows has no signal a console-less child reliably handles, so this
/// falls back to [`force_kill`] there.
pub fn terminate_gracefully(pid: u32) -> ProcessResult<()> {
    ensure_exists(pid)?;
    debug!(pid, "Terminating process");

    #[cfg(unix)]
    {
        send_signal(pid, nix::sys::signal::Signal::SIGTERM)
    }

    #[cfg(windows)]
    {
        force_kill_windows(pid)
    }
}

/// Force kill a process (SIGKILL on Unix, TerminateProcess on Windows).
pub fn force_kill(pid: u32) -> ProcessResult<()> {
    ensure_exists(pid)?;
    debug!(pid, "Killing process");

    #[cfg(unix)]
    {
        send_signal(pid, nix::sys::signal::Signal::SIGKILL)
    }

    #[cfg(windows)]
    {
        force_kill_windows(pid)
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) -> ProcessResult<()> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| ProcessError::stop_failed(pid.to_string(), "PID out of range"))?;
    kill(Pid::from_raw(raw), signal)
        .map_err(|e| ProcessError::stop_failed(pid.to_string(), e.to_string()))
}

#[cfg(windows)]
fn force_kill_windows(pid: u32) -> ProcessResult<()> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

    // SAFETY: the handle is checked before use and closed before returning.
    unsafe {
        let handle = match OpenProcess(PROCESS_TERMINATE, false, pid) {
            Ok(h) if !h.is_invalid() => h,
            _ => {
                return Err(ProcessError::stop_failed(
                    pid.to_string(),
                    "Failed to open process for termination",
                ));
            }
        };

        let result = TerminateProcess(handle, 1);
        let _ = CloseHandle(handle);

        result.map_err(|e| {
            ProcessError::stop_failed(pid.to_string(), format!("TerminateProcess failed: {}", e))
        })
    }
}
