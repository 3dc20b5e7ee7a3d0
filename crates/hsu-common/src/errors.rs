//! Error types for the HSU multiprocess test crates.
//!
//! Two layers of errors are defined here:
//!
//! - [`ProcessError`] covers operations on a single OS process (launch,
//!   wait, kill). It is `Clone` so it can be stored in test reports.
//! - [`Error`] is the crate-level error returned by the spawner and the
//!   child dispatch table. Process errors convert into it with `?`.
//!
//! ```rust
//! use hsu_common::{Error, ProcessError, Result};
//!
//! fn launch() -> std::result::Result<(), ProcessError> {
//!     Err(ProcessError::spawn_failed_with(
//!         "/no/such/binary",
//!         std::io::ErrorKind::NotFound,
//!         "executable does not exist",
//!     ))
//! }
//!
//! fn spawn() -> Result<()> {
//!     launch()?;
//!     Ok(())
//! }
//!
//! assert!(matches!(spawn(), Err(Error::Process(ProcessError::SpawnFailed { .. }))));
//! ```

use std::io;
use thiserror::Error;

use crate::types::FunctionName;

/// Result type alias for HSU operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for spawner and dispatch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input or configuration.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// The child dispatch table has no entry with this name.
    #[error("Child function not found: {name}")]
    FunctionNotFound {
        name: FunctionName,
    },

    /// A process-level operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with context.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a function not found error.
    pub fn function_not_found(name: impl Into<FunctionName>) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    /// Adds context to an error.
    ///
    /// # Example
    /// ```
    /// use hsu_common::{Error, Result};
    ///
    /// fn inner() -> Result<()> {
    ///     Err(Error::function_not_found("EchoFunction"))
    /// }
    ///
    /// fn outer() -> Result<()> {
    ///     inner().map_err(|e| e.context("Failed to run child"))
    /// }
    ///
    /// assert!(outer().unwrap_err().to_string().starts_with("Failed to run child"));
    /// ```
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost process error, looking through context layers.
    pub fn as_process_error(&self) -> Option<&ProcessError> {
        match self {
            Self::Process(e) => Some(e),
            Self::WithContext { source, .. } => source.as_process_error(),
            _ => None,
        }
    }
}

// Convenience methods for Result types
pub trait ResultExt<T> {
    /// Adds context to an error result.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(message))
    }
}

// ==============================================================================
// Process Errors
// ==============================================================================

/// Errors from operations on a single OS process.
///
/// `id` is whatever identifies the process at the point of failure: the
/// program path before launch, the pid afterwards.
#[derive(Error, Debug, Clone)]
pub enum ProcessError {
    #[error("Process not found: {id}")]
    NotFound { id: String },

    #[error("Process spawn failed: {id} - {reason}")]
    SpawnFailed {
        id: String,
        kind: io::ErrorKind,
        reason: String,
    },

    #[error("Process stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    #[error("Process wait failed: {id} - {reason}")]
    WaitFailed { id: String, reason: String },

    #[error("Process timeout: {id} - {operation}")]
    Timeout { id: String, operation: String },

    #[error("Process configuration error: {id} - {reason}")]
    Configuration { id: String, reason: String },
}

impl ProcessError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Builds a spawn failure from the OS error, keeping its kind.
    pub fn spawn_failed(id: impl Into<String>, error: &io::Error) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            kind: error.kind(),
            reason: error.to_string(),
        }
    }

    pub fn spawn_failed_with(
        id: impl Into<String>,
        kind: io::ErrorKind,
        reason: impl Into<String>,
    ) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn wait_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WaitFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Timeout {
            id: id.into(),
            operation: operation.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// OS error kind of a spawn failure, `None` for every other variant.
    pub fn spawn_error_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::SpawnFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
