//! Process liveness checks.

use hsu_common::{ProcessError, ProcessResult};

/// Check if a process with the given PID exists.
///
/// On Unix this uses `kill(pid, 0)`, which sends no signal but checks
/// whether the pid is in use. A child that has exited but has not been
/// reaped yet still exists. On Windows it uses `OpenProcess`.
///
/// # Examples
///
/// ```rust
/// use hsu_process::process_exists;
///
/// assert!(process_exists(std::process::id()).unwrap());
/// ```
pub fn process_exists(pid: u32) -> ProcessResult<bool> {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(windows)]
    {
        process_exists_windows(pid)
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> ProcessResult<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| ProcessError::configuration(pid.to_string(), "PID out of range"))?;

    match kill(Pid::from_raw(raw), None) {
        Ok(_) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        // Exists, owned by someone else.
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(ProcessError::configuration(
            pid.to_string(),
            format!("Failed to check process: {}", e),
        )),
    }
}

#[cfg(windows)]
fn process_exists_windows(pid: u32) -> ProcessResult<bool> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    const E_INVALIDARG: u32 = 0x8007_0057;
    const E_ACCESSDENIED: u32 = 0x8007_0005;

    // SAFETY: the handle is checked and closed before returning.
    unsafe {
        match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(handle) => {
                let _ = CloseHandle(handle);
                Ok(true)
            }
            Err(e) => {
                let code = e.code().0 as u32;
                if code == E_INVALIDARG || code == E_ACCESSDENIED {
                    Ok(false)
                } else {
                    Err(ProcessError::configuration(
                        pid.to_string(),
                        format!("Failed to check process: {}", e),
                    ))
                }
            }
        }
    }
}
