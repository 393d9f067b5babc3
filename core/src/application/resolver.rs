//! Process metadata resolution.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::domain::{ProcessInfo, UNKNOWN_PROCESS_NAME};
use crate::error::{Error, Result};
use crate::ports::SystemPort;

/// Resolves a PID to a [`ProcessInfo`] snapshot.
///
/// Each attribute is queried on its own; an unreadable attribute falls back
/// to its default instead of failing the whole resolution. Nothing is cached.
pub struct ProcessResolver<S: SystemPort> {
    system: Arc<S>,
}

impl<S: SystemPort> Clone for ProcessResolver<S> {
    fn clone(&self) -> Self {
        Self {
            system: Arc::clone(&self.system),
        }
    }
}

impl<S: SystemPort> ProcessResolver<S> {
    pub fn new(system: Arc<S>) -> Self {
        Self { system }
    }

    /// Resolve full metadata for a process.
    ///
    /// Fails with [`Error::NotFound`] when the process does not exist.
    pub async fn resolve(&self, pid: u32) -> Result<ProcessInfo> {
        if !self.system.process_exists(pid).await? {
            return Err(Error::NotFound(pid));
        }

        let name = match self.system.process_name(pid).await {
            Ok(name) => name,
            // Gone between the existence check and the first read.
            Err(Error::NotFound(_)) => return Err(Error::NotFound(pid)),
            Err(e) => fallback(pid, "name", e, UNKNOWN_PROCESS_NAME.to_string()),
        };
        let exe_path = self
            .system
            .process_exe(pid)
            .await
            .unwrap_or_else(|e| fallback(pid, "executable path", e, String::new()));
        let parent_pid = self
            .system
            .process_parent(pid)
            .await
            .unwrap_or_else(|e| fallback(pid, "parent", e, 0));
        let started_at = self
            .system
            .process_start_time(pid)
            .await
            .map(Some)
            .unwrap_or_else(|e| fallback(pid, "start time", e, None));

        Ok(ProcessInfo::new(
            pid,
            name,
            exe_path,
            parent_pid,
            started_at,
            Utc::now(),
        ))
    }

    /// Get the process name, failing if it cannot be read.
    pub async fn name(&self, pid: u32) -> Result<String> {
        self.system.process_name(pid).await
    }

    /// Get the executable path, failing if it cannot be read.
    pub async fn exe_path(&self, pid: u32) -> Result<String> {
        self.system.process_exe(pid).await
    }

    /// Resolve the parent of a process.
    ///
    /// Fails with [`Error::NoParent`] when the parent PID is 0.
    pub async fn parent(&self, pid: u32) -> Result<ProcessInfo> {
        let parent_pid = self.system.process_parent(pid).await?;
        if parent_pid == 0 {
            return Err(Error::NoParent(pid));
        }
        self.resolve(parent_pid).await
    }

    /// Check whether a process is still running.
    pub async fn is_running(&self, pid: u32) -> bool {
        self.system.process_exists(pid).await.unwrap_or(false)
    }
}

fn fallback<T>(pid: u32, attribute: &str, error: Error, default: T) -> T {
    debug!(pid = pid, attribute = attribute, error = %error, "Attribute unavailable, using default");
    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{FakeProcess, InMemorySystem};
    use chrono::TimeDelta;
    use std::time::Duration;

    fn resolver(system: InMemorySystem) -> ProcessResolver<InMemorySystem> {
        ProcessResolver::new(Arc::new(system))
    }

    #[tokio::test]
    async fn test_resolve_full() {
        let started = Utc::now() - TimeDelta::hours(2);
        let resolver = resolver(InMemorySystem::new().with_process(
            4321,
            FakeProcess::named("node.exe")
                .exe("C:\\Program Files\\nodejs\\node.exe")
                .parent(1)
                .started_at(started),
        ));

        let info = resolver.resolve(4321).await.unwrap();
        assert_eq!(info.pid, 4321);
        assert_eq!(info.name, "node.exe");
        assert_eq!(info.exe_path, "C:\\Program Files\\nodejs\\node.exe");
        assert_eq!(info.parent_pid, 1);
        assert_eq!(info.started_at, Some(started));
        assert!(info.uptime >= Duration::from_secs(2 * 3600));
        assert!(info.uptime < Duration::from_secs(2 * 3600 + 60));
    }

    #[tokio::test]
    async fn test_resolve_partial_uses_defaults() {
        let resolver = resolver(InMemorySystem::new().with_process(77, FakeProcess::anonymous()));

        let info = resolver.resolve(77).await.unwrap();
        assert_eq!(info.name, UNKNOWN_PROCESS_NAME);
        assert!(info.has_unknown_name());
        assert_eq!(info.exe_path, "");
        assert_eq!(info.parent_pid, 0);
        assert_eq!(info.started_at, None);
        assert_eq!(info.uptime, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let resolver = resolver(InMemorySystem::new());
        let err = resolver.resolve(999).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_strict_name_fails_when_unreadable() {
        let resolver = resolver(InMemorySystem::new().with_process(77, FakeProcess::anonymous()));
        assert!(matches!(
            resolver.name(77).await,
            Err(Error::AttributeUnavailable { pid: 77, .. })
        ));
    }

    #[tokio::test]
    async fn test_parent() {
        let resolver = resolver(
            InMemorySystem::new()
                .with_process(1, FakeProcess::named("init"))
                .with_process(50, FakeProcess::named("bash").parent(1))
                .with_process(60, FakeProcess::named("orphan").parent(0)),
        );

        let parent = resolver.parent(50).await.unwrap();
        assert_eq!(parent.pid, 1);
        assert_eq!(parent.name, "init");

        assert!(matches!(resolver.parent(60).await, Err(Error::NoParent(60))));
    }

    #[tokio::test]
    async fn test_is_running() {
        let resolver = resolver(InMemorySystem::new().with_process(1, FakeProcess::named("init")));
        assert!(resolver.is_running(1).await);
        assert!(!resolver.is_running(2).await);
    }
}
