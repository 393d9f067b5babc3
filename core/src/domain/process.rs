//! Process metadata snapshot.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name reported when a process name cannot be read.
pub const UNKNOWN_PROCESS_NAME: &str = "unknown";

/// Point-in-time metadata about a single process.
///
/// Built fresh on every resolution. Attributes the OS refused to report carry
/// their defaults: `"unknown"` name, empty executable path, parent `0`, no
/// start time and zero uptime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process ID.
    pub pid: u32,
    /// Display name (e.g. "node", "svchost.exe").
    pub name: String,
    /// Full path to the executable, empty if unreadable.
    pub exe_path: String,
    /// Parent process ID, 0 if unreadable.
    pub parent_pid: u32,
    /// When the process started, if known.
    pub started_at: Option<DateTime<Utc>>,
    /// Time elapsed since `started_at` at resolution time.
    pub uptime: Duration,
}

impl ProcessInfo {
    /// Build a snapshot, deriving uptime from `started_at` relative to `now`.
    pub fn new(
        pid: u32,
        name: impl Into<String>,
        exe_path: impl Into<String>,
        parent_pid: u32,
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let uptime = started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default();

        Self {
            pid,
            name: name.into(),
            exe_path: exe_path.into(),
            parent_pid,
            started_at,
            uptime,
        }
    }

    /// Whether the name could not be read.
    pub fn has_unknown_name(&self) -> bool {
        self.name == UNKNOWN_PROCESS_NAME
    }
}

impl std::fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PID: {}, Parent: {})", self.name, self.pid, self.parent_pid)
    }
}
