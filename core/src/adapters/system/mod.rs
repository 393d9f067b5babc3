//! Platform implementation of [`SystemPort`].
//!
//! - Connections: `ss` on Linux, `lsof` on macOS, `netstat` on Windows
//! - Process metadata: sysinfo
//! - Termination: signals on Unix, `taskkill` on Windows

mod darwin;
mod linux;
mod process;
mod utils;
mod windows;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
use unix as killer;

#[cfg(windows)]
use windows as killer;

#[cfg(not(any(unix, windows)))]
compile_error!("Unsupported platform: only Unix and Windows are supported");

use chrono::{DateTime, Utc};

use crate::domain::RawConnection;
use crate::error::{Error, Result};
use crate::ports::SystemPort;

use process::ProcessTable;

#[cfg(target_os = "linux")]
type PlatformConnections = linux::SsSource;

#[cfg(target_os = "macos")]
type PlatformConnections = darwin::LsofSource;

#[cfg(target_os = "windows")]
type PlatformConnections = windows::NetstatSource;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
type PlatformConnections = UnsupportedSource;

/// The operating system this program runs on.
pub struct PlatformSystem {
    connections: PlatformConnections,
    processes: ProcessTable,
}

impl PlatformSystem {
    pub fn new() -> Self {
        Self {
            connections: PlatformConnections::default(),
            processes: ProcessTable::new(),
        }
    }
}

impl Default for PlatformSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPort for PlatformSystem {
    async fn connections(&self) -> Result<Vec<RawConnection>> {
        self.connections.connections().await
    }

    async fn process_exists(&self, pid: u32) -> Result<bool> {
        Ok(self.processes.exists(pid))
    }

    async fn process_name(&self, pid: u32) -> Result<String> {
        self.processes.name(pid)
    }

    async fn process_exe(&self, pid: u32) -> Result<String> {
        self.processes.exe(pid)
    }

    async fn process_parent(&self, pid: u32) -> Result<u32> {
        self.processes.parent(pid)
    }

    async fn process_start_time(&self, pid: u32) -> Result<DateTime<Utc>> {
        self.processes.start_time(pid)
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        killer::terminate(pid).await
    }

    async fn force_terminate(&self, pid: u32) -> Result<()> {
        killer::force_terminate(pid).await
    }

    async fn is_elevated(&self) -> bool {
        killer::is_elevated().await
    }
}

/// Internal trait for platform-specific connection enumeration.
trait ConnectionSource: Send + Sync {
    fn connections(&self) -> impl std::future::Future<Output = Result<Vec<RawConnection>>> + Send;
}

/// Connection source for platforms without a supported tool.
#[derive(Default)]
pub struct UnsupportedSource;

impl ConnectionSource for UnsupportedSource {
    async fn connections(&self) -> Result<Vec<RawConnection>> {
        Err(Error::UnsupportedPlatform(format!(
            "Connection enumeration is not supported on {}",
            std::env::consts::OS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_process_metadata() {
        let system = PlatformSystem::new();
        let pid = std::process::id();

        assert!(system.process_exists(pid).await.unwrap());
        assert!(!system.process_name(pid).await.unwrap().is_empty());
        assert!(system.process_parent(pid).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_unsupported_source() {
        let err = UnsupportedSource.connections().await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
    }
}
