//! Connection scanning and process correlation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{is_critical, ConnectionEntry, ConnectionState, ProcessInfo, Protocol, RawConnection};
use crate::error::Result;
use crate::ports::SystemPort;

use super::ProcessResolver;

/// PID -> resolution outcome for the duration of a single scan.
///
/// Created by [`ConnectionScanner::scan`] and dropped when it returns, so
/// concurrent scans never share one.
#[derive(Debug, Default)]
pub struct ProcessCache {
    entries: HashMap<u32, Option<ProcessInfo>>,
}

impl ProcessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached resolution for `pid`, resolving it on first use.
    ///
    /// `None` means the process could not be resolved.
    pub async fn get_or_resolve<S: SystemPort>(
        &mut self,
        pid: u32,
        resolver: &ProcessResolver<S>,
    ) -> Option<&ProcessInfo> {
        if !self.entries.contains_key(&pid) {
            let resolved = match resolver.resolve(pid).await {
                Ok(info) => Some(info),
                Err(e) => {
                    debug!(pid = pid, error = %e, "Skipping connections of unresolvable process");
                    None
                }
            };
            self.entries.insert(pid, resolved);
        }
        self.entries.get(&pid).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Enumerates connections and joins them with their owning processes.
///
/// Holds no mutable state; every scan is an independent snapshot.
pub struct ConnectionScanner<S: SystemPort> {
    system: Arc<S>,
    resolver: ProcessResolver<S>,
}

impl<S: SystemPort> ConnectionScanner<S> {
    pub fn new(system: Arc<S>) -> Self {
        let resolver = ProcessResolver::new(Arc::clone(&system));
        Self { system, resolver }
    }

    /// Scan all TCP/UDP connections, keeping those whose state is in `states`.
    ///
    /// An empty `states` keeps every state. Entries come back in OS
    /// enumeration order.
    pub async fn scan(&self, states: &[ConnectionState]) -> Result<Vec<ConnectionEntry>> {
        let connections = self.system.connections().await?;
        let mut cache = ProcessCache::new();
        let entries = self.correlate(connections, states, &mut cache).await;

        debug!(
            entries = entries.len(),
            processes = cache.len(),
            "Connection scan complete"
        );
        Ok(entries)
    }

    /// Join raw connections with process metadata using `cache`.
    pub async fn correlate(
        &self,
        connections: Vec<RawConnection>,
        states: &[ConnectionState],
        cache: &mut ProcessCache,
    ) -> Vec<ConnectionEntry> {
        let mut entries = Vec::with_capacity(connections.len());

        for conn in connections {
            if conn.pid == 0 {
                continue;
            }

            let Some(protocol) = Protocol::from_raw(&conn.protocol) else {
                continue;
            };

            let state = ConnectionState::from_raw(&conn.status);
            if !state.admitted_by(states) {
                continue;
            }

            let Some(process) = cache.get_or_resolve(conn.pid, &self.resolver).await else {
                continue;
            };

            entries.push(ConnectionEntry::new(
                protocol,
                &conn.local_ip,
                conn.local_port,
                state,
                process,
                is_critical(&process.name),
            ));
        }

        entries
    }

    /// All connections on a local port, regardless of state.
    pub async fn by_port(&self, port: u16) -> Result<Vec<ConnectionEntry>> {
        let mut entries = self.scan(&[]).await?;
        entries.retain(|e| e.port == port);
        Ok(entries)
    }

    /// All connections owned by a process, regardless of state.
    pub async fn by_process(&self, pid: u32) -> Result<Vec<ConnectionEntry>> {
        let mut entries = self.scan(&[]).await?;
        entries.retain(|e| e.pid == pid);
        Ok(entries)
    }

    /// The first connection owned by `pid` on `port`, if any.
    pub async fn find_entry(&self, pid: u32, port: u16) -> Result<Option<ConnectionEntry>> {
        let entries = self.scan(&[]).await?;
        Ok(entries.into_iter().find(|e| e.pid == pid && e.port == port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{FakeProcess, InMemorySystem};
    use chrono::{TimeDelta, Utc};
    use std::collections::HashSet;

    fn scanner(system: InMemorySystem) -> (ConnectionScanner<InMemorySystem>, Arc<InMemorySystem>) {
        let system = Arc::new(system);
        (ConnectionScanner::new(Arc::clone(&system)), system)
    }

    fn sample_system() -> InMemorySystem {
        InMemorySystem::new()
            .with_process(100, FakeProcess::named("nginx").parent(1))
            .with_process(200, FakeProcess::named("node").parent(1))
            .with_process(4, FakeProcess::named("System"))
            .with_connection(RawConnection::tcp("0.0.0.0", 80, "LISTEN", 100))
            .with_connection(RawConnection::tcp("10.0.0.5", 80, "ESTABLISHED", 100))
            .with_connection(RawConnection::tcp("127.0.0.1", 3000, "LISTEN", 200))
            .with_connection(RawConnection::udp("", 5353, 200))
            .with_connection(RawConnection::tcp("0.0.0.0", 445, "LISTEN", 4))
    }

    #[tokio::test]
    async fn test_scan_all() {
        let (scanner, _) = scanner(sample_system());
        let entries = scanner.scan(&[]).await.unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].port, 80);
        assert_eq!(entries[0].state, ConnectionState::Listening);
        assert_eq!(entries[3].protocol, Protocol::Udp);
        assert_eq!(entries[3].local_address, "0.0.0.0:5353");
        assert_eq!(entries[3].state, ConnectionState::Bound);
    }

    #[tokio::test]
    async fn test_protected_flag() {
        let (scanner, _) = scanner(sample_system());
        let entries = scanner.by_process(4).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].protected);

        let entries = scanner.by_process(200).await.unwrap();
        assert!(entries.iter().all(|e| !e.protected));
    }

    #[tokio::test]
    async fn test_skips_pid_zero() {
        let (scanner, _) = scanner(
            sample_system().with_connection(RawConnection::tcp("0.0.0.0", 139, "LISTEN", 0)),
        );
        let entries = scanner.scan(&[]).await.unwrap();
        assert_eq!(entries.len(), 5);
        assert!(entries.iter().all(|e| e.pid != 0));
    }

    #[tokio::test]
    async fn test_skips_other_protocols() {
        let (scanner, _) = scanner(
            sample_system().with_connection(RawConnection::new("unix", "", 0, "CONNECTED", 200)),
        );
        assert_eq!(scanner.scan(&[]).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_skips_unresolvable_process() {
        let (scanner, _) = scanner(
            sample_system().with_connection(RawConnection::tcp("0.0.0.0", 9000, "LISTEN", 999)),
        );
        let entries = scanner.scan(&[]).await.unwrap();
        assert!(entries.iter().all(|e| e.pid != 999));
    }

    #[tokio::test]
    async fn test_state_filter() {
        let (scanner, _) = scanner(sample_system());

        let listening = scanner.scan(&[ConnectionState::Listening]).await.unwrap();
        assert_eq!(listening.len(), 3);
        assert!(listening.iter().all(|e| e.state == ConnectionState::Listening));

        let established = scanner
            .scan(&[ConnectionState::parse("ESTABLISHED")])
            .await
            .unwrap();
        assert_eq!(established.len(), 1);

        let lowercase = scanner
            .scan(&[ConnectionState::parse("listening")])
            .await
            .unwrap();
        assert!(lowercase.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_state_passes_through() {
        let (scanner, _) = scanner(
            InMemorySystem::new()
                .with_process(7, FakeProcess::named("daemon"))
                .with_connection(RawConnection::new("udp", "0.0.0.0", 68, "NONE", 7)),
        );
        let entries = scanner.scan(&[]).await.unwrap();
        assert_eq!(entries[0].state.as_str(), "NONE");

        let filtered = scanner.scan(&[ConnectionState::parse("NONE")]).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_process_resolved_once_per_scan() {
        let (scanner, system) = scanner(sample_system());
        scanner.scan(&[]).await.unwrap();
        assert_eq!(system.existence_checks(100), 1);
        assert_eq!(system.existence_checks(200), 1);

        // A second scan starts with a fresh cache.
        scanner.scan(&[]).await.unwrap();
        assert_eq!(system.existence_checks(100), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_process_looked_up_once() {
        let (scanner, system) = scanner(
            InMemorySystem::new()
                .with_connection(RawConnection::tcp("0.0.0.0", 1, "LISTEN", 999))
                .with_connection(RawConnection::tcp("0.0.0.0", 2, "LISTEN", 999)),
        );
        assert!(scanner.scan(&[]).await.unwrap().is_empty());
        assert_eq!(system.existence_checks(999), 1);
    }

    #[tokio::test]
    async fn test_consecutive_scans_are_set_equal() {
        let started = Utc::now() - TimeDelta::seconds(300);
        let (scanner, _) = scanner(
            sample_system()
                .with_process(300, FakeProcess::named("postgres").parent(1).started_at(started))
                .with_connection(RawConnection::tcp("0.0.0.0", 5432, "LISTEN", 300)),
        );

        let first = scanner.scan(&[]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = scanner.scan(&[]).await.unwrap();

        let postgres = |entries: &[ConnectionEntry]| {
            entries.iter().find(|e| e.pid == 300).map(|e| e.uptime)
        };
        assert_ne!(postgres(&first), postgres(&second));

        let first: HashSet<_> = first.into_iter().collect();
        let second: HashSet<_> = second.into_iter().collect();
        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_by_port() {
        let (scanner, _) = scanner(sample_system());
        let entries = scanner.by_port(80).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.pid == 100));
        assert!(scanner.by_port(9999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_entry() {
        let (scanner, _) = scanner(sample_system());
        let entry = scanner.find_entry(200, 3000).await.unwrap().unwrap();
        assert_eq!(entry.process_name, "node");
        assert!(scanner.find_entry(200, 80).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enumeration_failure_propagates() {
        let (scanner, _) = scanner(InMemorySystem::new().with_enumeration_error("ss missing"));
        let err = scanner.scan(&[]).await.unwrap_err();
        assert!(err.to_string().contains("ss missing"));
    }
}
