//! Process metadata from sysinfo.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

use crate::error::{Error, Result};

/// Per-PID process lookups.
///
/// Each read refreshes only the requested PID, so attributes always reflect
/// the process as it is now.
pub struct ProcessTable {
    system: Mutex<System>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    /// Zombies count as gone: they have exited and only await reaping.
    pub fn exists(&self, pid: u32) -> bool {
        let mut system = self.system.lock();
        refresh(&mut system, pid).is_some_and(|p| p.status() != ProcessStatus::Zombie)
    }

    pub fn name(&self, pid: u32) -> Result<String> {
        self.read(pid, "name", |p| {
            let name = p.name().to_string_lossy().into_owned();
            (!name.is_empty()).then_some(name)
        })
    }

    pub fn exe(&self, pid: u32) -> Result<String> {
        self.read(pid, "executable path", |p| {
            p.exe().map(|path| path.display().to_string())
        })
    }

    /// Parent PID, 0 when the process has none.
    pub fn parent(&self, pid: u32) -> Result<u32> {
        self.read(pid, "parent", |p| Some(p.parent().map(|pp| pp.as_u32()).unwrap_or(0)))
    }

    pub fn start_time(&self, pid: u32) -> Result<DateTime<Utc>> {
        self.read(pid, "start time", |p| match p.start_time() {
            0 => None,
            secs => i64::try_from(secs)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }

    fn read<T>(
        &self,
        pid: u32,
        attribute: &'static str,
        f: impl FnOnce(&Process) -> Option<T>,
    ) -> Result<T> {
        let mut system = self.system.lock();
        let process = refresh(&mut system, pid).ok_or(Error::NotFound(pid))?;
        f(process).ok_or(Error::AttributeUnavailable { pid, attribute })
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

fn refresh(system: &mut System, pid: u32) -> Option<&Process> {
    let pid = Pid::from_u32(pid);
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::everything(),
    );
    system.process(pid)
}
