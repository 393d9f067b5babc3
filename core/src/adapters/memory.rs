//! In-memory operating system.
//!
//! A scripted [`SystemPort`] for tests and demos: processes and connections are
//! declared up front, termination primitives behave as configured per process,
//! and every call to a primitive is recorded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::RawConnection;
use crate::error::{Error, Result};
use crate::ports::SystemPort;

/// How a fake process reacts to a termination primitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TerminationBehavior {
    /// The process exits.
    #[default]
    Exit,
    /// The primitive fails with this OS error text; the process keeps running.
    Fail(String),
    /// The process exited on its own just before the primitive ran.
    Vanish,
    /// The primitive is accepted but the process keeps running, like a
    /// process that traps SIGTERM.
    Ignore,
}

/// Which termination primitive was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Graceful,
    Forced,
}

/// A scripted process. Attributes left unset are unreadable.
#[derive(Debug, Clone, Default)]
pub struct FakeProcess {
    name: Option<String>,
    exe: Option<String>,
    parent: Option<u32>,
    started_at: Option<DateTime<Utc>>,
    on_graceful: TerminationBehavior,
    on_forced: TerminationBehavior,
}

impl FakeProcess {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A process whose attributes are all unreadable.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn exe(mut self, path: impl Into<String>) -> Self {
        self.exe = Some(path.into());
        self
    }

    pub fn parent(mut self, pid: u32) -> Self {
        self.parent = Some(pid);
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn on_graceful(mut self, behavior: TerminationBehavior) -> Self {
        self.on_graceful = behavior;
        self
    }

    pub fn on_forced(mut self, behavior: TerminationBehavior) -> Self {
        self.on_forced = behavior;
        self
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    processes: HashMap<u32, FakeProcess>,
    connections: Vec<RawConnection>,
    enumeration_error: Option<String>,
    elevated: bool,
    calls: Vec<(u32, Primitive)>,
    existence_checks: HashMap<u32, usize>,
}

/// Scripted [`SystemPort`] implementation.
#[derive(Debug, Default)]
pub struct InMemorySystem {
    state: Mutex<MemoryState>,
}

impl InMemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, pid: u32, process: FakeProcess) -> Self {
        self.state.lock().processes.insert(pid, process);
        self
    }

    pub fn with_connection(self, connection: RawConnection) -> Self {
        self.state.lock().connections.push(connection);
        self
    }

    /// Make connection enumeration fail with this message.
    pub fn with_enumeration_error(self, message: impl Into<String>) -> Self {
        self.state.lock().enumeration_error = Some(message.into());
        self
    }

    pub fn with_elevation(self, elevated: bool) -> Self {
        self.state.lock().elevated = elevated;
        self
    }

    /// Replace a process, e.g. to simulate PID reuse.
    pub fn replace_process(&self, pid: u32, process: FakeProcess) {
        self.state.lock().processes.insert(pid, process);
    }

    /// Remove a process as if it exited.
    pub fn remove_process(&self, pid: u32) {
        self.state.lock().processes.remove(&pid);
    }

    /// Every termination primitive call, in order.
    pub fn termination_calls(&self) -> Vec<(u32, Primitive)> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, primitive: Primitive) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(_, p)| *p == primitive)
            .count()
    }

    /// How many times the existence of `pid` was checked.
    pub fn existence_checks(&self, pid: u32) -> usize {
        self.state
            .lock()
            .existence_checks
            .get(&pid)
            .copied()
            .unwrap_or(0)
    }

    fn attribute<T>(
        &self,
        pid: u32,
        attribute: &'static str,
        read: impl FnOnce(&FakeProcess) -> Option<T>,
    ) -> Result<T> {
        let state = self.state.lock();
        let process = state.processes.get(&pid).ok_or(Error::NotFound(pid))?;
        read(process).ok_or(Error::AttributeUnavailable { pid, attribute })
    }

    fn run_primitive(&self, pid: u32, primitive: Primitive) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push((pid, primitive));

        let behavior = match state.processes.get(&pid) {
            Some(process) => match primitive {
                Primitive::Graceful => process.on_graceful.clone(),
                Primitive::Forced => process.on_forced.clone(),
            },
            None => return Err(Error::NotFound(pid)),
        };

        match behavior {
            TerminationBehavior::Exit => {
                state.processes.remove(&pid);
                state.connections.retain(|c| c.pid != pid);
                Ok(())
            }
            TerminationBehavior::Fail(reason) => Err(Error::KillFailed { pid, reason }),
            TerminationBehavior::Vanish => {
                state.processes.remove(&pid);
                state.connections.retain(|c| c.pid != pid);
                Err(Error::NotFound(pid))
            }
            TerminationBehavior::Ignore => Ok(()),
        }
    }
}

impl SystemPort for InMemorySystem {
    async fn connections(&self) -> Result<Vec<RawConnection>> {
        let state = self.state.lock();
        match &state.enumeration_error {
            Some(message) => Err(Error::CommandFailed(message.clone())),
            None => Ok(state.connections.clone()),
        }
    }

    async fn process_exists(&self, pid: u32) -> Result<bool> {
        let mut state = self.state.lock();
        *state.existence_checks.entry(pid).or_default() += 1;
        Ok(state.processes.contains_key(&pid))
    }

    async fn process_name(&self, pid: u32) -> Result<String> {
        self.attribute(pid, "name", |p| p.name.clone())
    }

    async fn process_exe(&self, pid: u32) -> Result<String> {
        self.attribute(pid, "executable path", |p| p.exe.clone())
    }

    async fn process_parent(&self, pid: u32) -> Result<u32> {
        self.attribute(pid, "parent", |p| p.parent)
    }

    async fn process_start_time(&self, pid: u32) -> Result<DateTime<Utc>> {
        self.attribute(pid, "start time", |p| p.started_at)
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        self.run_primitive(pid, Primitive::Graceful)
    }

    async fn force_terminate(&self, pid: u32) -> Result<()> {
        self.run_primitive(pid, Primitive::Forced)
    }

    async fn is_elevated(&self) -> bool {
        self.state.lock().elevated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exit_removes_process_and_connections() {
        let system = InMemorySystem::new()
            .with_process(10, FakeProcess::named("node"))
            .with_connection(RawConnection::tcp("127.0.0.1", 3000, "LISTEN", 10));

        system.terminate(10).await.unwrap();
        assert!(!system.process_exists(10).await.unwrap());
        assert!(system.connections().await.unwrap().is_empty());
        assert_eq!(system.termination_calls(), vec![(10, Primitive::Graceful)]);
    }

    #[tokio::test]
    async fn test_fail_keeps_process() {
        let system = InMemorySystem::new().with_process(
            10,
            FakeProcess::named("node").on_forced(TerminationBehavior::Fail("busy".into())),
        );

        let err = system.force_terminate(10).await.unwrap_err();
        assert!(err.to_string().contains("busy"));
        assert!(system.process_exists(10).await.unwrap());
        assert_eq!(system.calls_of(Primitive::Forced), 1);
    }

    #[tokio::test]
    async fn test_ignore_accepts_signal_and_keeps_process() {
        let system = InMemorySystem::new()
            .with_process(10, FakeProcess::named("node").on_graceful(TerminationBehavior::Ignore));

        system.terminate(10).await.unwrap();
        assert!(system.process_exists(10).await.unwrap());
        assert_eq!(system.termination_calls(), vec![(10, Primitive::Graceful)]);
    }

    #[tokio::test]
    async fn test_missing_process_attribute() {
        let system = InMemorySystem::new();
        assert!(system.process_name(1).await.unwrap_err().is_not_found());
    }
}
