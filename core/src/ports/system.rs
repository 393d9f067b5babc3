//! Operating system port (interface).

use chrono::{DateTime, Utc};

use crate::domain::RawConnection;
use crate::error::Result;

/// Port for everything the engine asks of the operating system.
///
/// Every method is fallible. Process attribute getters return
/// [`Error::NotFound`](crate::Error::NotFound) when the process does not
/// exist and another error when only that attribute is unreadable.
/// Termination primitives return `NotFound` when the process is already gone.
pub trait SystemPort: Send + Sync {
    /// Enumerate all TCP/UDP connections in one snapshot.
    fn connections(&self) -> impl std::future::Future<Output = Result<Vec<RawConnection>>> + Send;

    /// Check whether a process with this PID exists.
    fn process_exists(&self, pid: u32) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Get the process name.
    fn process_name(&self, pid: u32) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Get the full executable path.
    fn process_exe(&self, pid: u32) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Get the parent PID.
    fn process_parent(&self, pid: u32) -> impl std::future::Future<Output = Result<u32>> + Send;

    /// Get the process start time.
    fn process_start_time(
        &self,
        pid: u32,
    ) -> impl std::future::Future<Output = Result<DateTime<Utc>>> + Send;

    /// Ask a process to exit (SIGTERM / `taskkill`).
    fn terminate(&self, pid: u32) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Stop a process unconditionally (SIGKILL / `taskkill /F`).
    fn force_terminate(&self, pid: u32) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Whether the current process runs with administrator/root privileges.
    fn is_elevated(&self) -> impl std::future::Future<Output = bool> + Send;
}
