//! PortExec Core Library
//!
//! Correlates network connections with the processes that own them and
//! terminates those processes safely. Provides functionality to:
//! - Enumerate TCP/UDP connections joined with process metadata
//! - Resolve a PID to its name, executable, parent and uptime
//! - Kill processes while refusing critical operating-system processes
//! - Persist user settings
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data types and the critical-process classifier
//! - `ports`: The [`SystemPort`] capability trait
//! - `adapters`: The real operating system and an in-memory stand-in
//! - `application`: Resolver, scanner and termination guard services
//!
//! # Platform Support
//! - Linux: `ss`, signals
//! - macOS: `lsof`, signals
//! - Windows: `netstat`, `taskkill`

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

use std::sync::Arc;

// Re-export domain types (primary API)
pub use domain::{
    classify, filter_entries, is_critical, AccessCheck, ConnectionEntry, ConnectionState,
    Criticality, FilterCriteria, KillFailure, KillResult, ProcessInfo, Protocol, RawConnection,
};

// Re-export other commonly used types
pub use adapters::{InMemorySystem, PlatformSystem};
pub use application::{ConnectionScanner, ProcessResolver, TerminationGuard};
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result};
pub use ports::SystemPort;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main entry point: the three services wired to one system capability.
pub struct PortExec<S: SystemPort = PlatformSystem> {
    resolver: ProcessResolver<S>,
    scanner: ConnectionScanner<S>,
    guard: TerminationGuard<S>,
}

impl PortExec<PlatformSystem> {
    /// Create an instance backed by the current operating system.
    pub fn new() -> Self {
        Self::with_system(Arc::new(PlatformSystem::new()))
    }
}

impl Default for PortExec<PlatformSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SystemPort> PortExec<S> {
    /// Create an instance backed by the given system.
    pub fn with_system(system: Arc<S>) -> Self {
        Self {
            resolver: ProcessResolver::new(Arc::clone(&system)),
            scanner: ConnectionScanner::new(Arc::clone(&system)),
            guard: TerminationGuard::new(system),
        }
    }

    pub fn resolver(&self) -> &ProcessResolver<S> {
        &self.resolver
    }

    pub fn scanner(&self) -> &ConnectionScanner<S> {
        &self.scanner
    }

    pub fn guard(&self) -> &TerminationGuard<S> {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::FakeProcess;

    #[tokio::test]
    async fn test_services_share_one_system() {
        let system = Arc::new(
            InMemorySystem::new()
                .with_process(42, FakeProcess::named("redis-server"))
                .with_connection(RawConnection::tcp("127.0.0.1", 6379, "LISTEN", 42)),
        );
        let core = PortExec::with_system(Arc::clone(&system));

        assert_eq!(core.scanner().by_port(6379).await.unwrap().len(), 1);
        assert!(core.guard().kill(42).await.success);
        assert!(!core.resolver().is_running(42).await);
        assert!(core.scanner().by_port(6379).await.unwrap().is_empty());
    }
}
