//! Error types for the portexec-core library.

use thiserror::Error;

/// Result type alias for portexec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating connections and managing processes.
#[derive(Error, Debug)]
pub enum Error {
    /// The process does not exist (or no longer exists).
    #[error("Process {0} not found")]
    NotFound(u32),

    /// A single process attribute could not be read.
    #[error("Could not read {attribute} of process {pid}")]
    AttributeUnavailable { pid: u32, attribute: &'static str },

    /// The process reports no parent.
    #[error("Process {0} has no parent")]
    NoParent(u32),

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// A termination primitive failed.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// Permission denied for an operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

impl Error {
    /// Whether this error means the target process does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
