//! Error types for the haltkit-core library.

use thiserror::Error;

/// Result type alias for haltkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while controlling workers and process trees.
#[derive(Error, Debug)]
pub enum Error {
    /// The operation is not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An argument was outside its accepted range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),

    /// The process does not exist (or no longer exists).
    #[error("Process with PID {0} not found")]
    ProcessNotFound(u32),

    /// Permission denied to act on a process.
    #[error("Permission denied for process {0}")]
    PermissionDenied(u32),

    /// Failed to kill a process.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output or a process table entry.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// The controller's dedicated thread panicked.
    #[error("Control thread panicked")]
    ControlThreadPanicked,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure captured from a worker run.
///
/// These never cross the worker boundary as a `Result`; the worker records
/// them and callers read them back with `TerminableWorker::last_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The work observed a cooperative cancellation request.
    #[error("Work was cancelled")]
    Cancelled,

    /// The work observed a forced abort.
    #[error("Work was aborted")]
    Aborted,

    /// The work returned an error of its own.
    #[error("Work failed: {0}")]
    Failed(String),

    /// The work panicked.
    #[error("Work panicked: {0}")]
    Panicked(String),
}

impl WorkerError {
    /// Build a `Failed` error from anything displayable.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        WorkerError::Failed(reason.to_string())
    }

    /// True for errors caused by the cancellation signal, at either level.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WorkerError::Cancelled | WorkerError::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ProcessNotFound(1234);
        assert!(err.to_string().contains("1234"));

        let err = Error::KillFailed {
            pid: 5678,
            reason: "busy".to_string(),
        };
        assert!(err.to_string().contains("5678"));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(WorkerError::Cancelled.is_cancellation());
        assert!(WorkerError::Aborted.is_cancellation());
        assert!(!WorkerError::failed("disk full").is_cancellation());
        assert!(!WorkerError::Panicked("boom".into()).is_cancellation());
    }
}
