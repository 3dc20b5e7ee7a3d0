//! Validation of launch inputs.

use std::io;
use std::path::{Component, Path};

use hsu_common::{Error, ProcessError, ProcessResult, Result};

/// Longest accepted child function name.
pub const MAX_FUNCTION_NAME_LEN: usize = 128;

/// Validate that an executable path can be handed to the OS.
///
/// Bare program names (no directory part) are left to the OS search path;
/// explicit paths must exist.
pub fn validate_executable(path: impl AsRef<Path>) -> ProcessResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ProcessError::configuration(
            "validation",
            "Executable path cannot be empty",
        ));
    }

    let is_bare_name = matches!(
        path.components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !is_bare_name && !path.exists() {
        return Err(ProcessError::spawn_failed_with(
            path.display().to_string(),
            io::ErrorKind::NotFound,
            "Executable does not exist",
        ));
    }

    Ok(())
}

/// Validate a child function name before it goes on a command line.
///
/// Names must be non-empty, at most [`MAX_FUNCTION_NAME_LEN`] characters,
/// and use only ASCII alphanumerics, `_`, `-`, `.` and `:`.
pub fn validate_function_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation("Child function name cannot be empty"));
    }

    if name.len() > MAX_FUNCTION_NAME_LEN {
        return Err(Error::validation(format!(
            "Child function name too long (max {} characters): {}",
            MAX_FUNCTION_NAME_LEN, name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    {
        return Err(Error::validation(format!(
            "Child function name can only contain alphanumeric characters, \
             '_', '-', '.' and ':': {:?}",
            name
        )));
    }

    Ok(())
}
