//! Outcomes of termination attempts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error phrasings that indicate missing privileges, matched case-insensitively.
const PERMISSION_PHRASES: &[&str] = &[
    "access is denied",
    "operation not permitted",
    "permission denied",
];

/// Whether an OS error message reads as a privilege problem.
pub fn is_permission_error(message: &str) -> bool {
    let message = message.to_lowercase();
    PERMISSION_PHRASES.iter().any(|p| message.contains(p))
}

/// Why a termination attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum KillFailure {
    /// The process did not exist when the attempt started.
    #[error("process {pid} not found")]
    NotFound { pid: u32 },

    /// The process name could not be resolved, so it could not be classified.
    #[error("could not resolve process {pid}: {detail}")]
    Unresolvable { pid: u32, detail: String },

    /// The classifier protects this process.
    #[error("critical system process: {name}")]
    Protected { pid: u32, name: String },

    /// The PID now belongs to a different process than the caller expected.
    #[error("process name mismatch: expected {expected}, got {actual}")]
    Mismatch {
        pid: u32,
        expected: String,
        actual: String,
    },

    /// The OS refused for lack of privileges.
    #[error("permission denied: {detail}")]
    PermissionDenied { pid: u32, detail: String },

    /// Any other OS failure.
    #[error("{detail}")]
    Failed { pid: u32, detail: String },
}

impl KillFailure {
    /// A failure the operator can fix by re-running elevated.
    pub fn needs_elevation(&self) -> bool {
        matches!(self, KillFailure::PermissionDenied { .. })
    }
}

/// Result of a single kill request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillResult {
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Categorized cause when `success` is false.
    pub failure: Option<KillFailure>,
}

impl KillResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            failure: None,
        }
    }

    pub fn failed(message: impl Into<String>, failure: KillFailure) -> Self {
        Self {
            success: false,
            message: message.into(),
            failure: Some(failure),
        }
    }
}

impl std::fmt::Display for KillResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Pre-flight verdict on whether a process looks accessible.
///
/// Advisory only: privileges may change before the actual kill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCheck {
    pub allowed: bool,
    pub reason: String,
}
