//! Critical-process classification.
//!
//! Decides whether a process name belongs to the operating system itself and
//! must not be terminated through the ordinary kill path. The verdict depends
//! on the name only, never on the PID: PIDs are reused, names are what the
//! policy is about.

use serde::{Deserialize, Serialize};

/// Classification of a process name against the protection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criticality {
    /// Terminating it risks OS instability.
    Critical,
    /// A well-known system name that is nevertheless safe to kill.
    ExplicitlyAllowed,
    /// Not in the table.
    Unlisted,
}

impl Criticality {
    pub fn is_critical(&self) -> bool {
        matches!(self, Criticality::Critical)
    }
}

/// Process family whose members host many OS services each.
const SERVICE_HOST_PREFIX: &str = "svchost";

const EXE_SUFFIX: &str = ".exe";

/// Names are stored without a `.exe` suffix; lookups normalize both ways.
const PROCESS_TABLE: &[(&str, Criticality)] = &[
    // Windows kernel and session bootstrap
    ("System", Criticality::Critical),
    ("System Idle Process", Criticality::Critical),
    ("Registry", Criticality::Critical),
    ("smss", Criticality::Critical),
    ("csrss", Criticality::Critical),
    ("wininit", Criticality::Critical),
    ("winlogon", Criticality::Critical),
    // Service control manager and service host
    ("services", Criticality::Critical),
    ("svchost", Criticality::Critical),
    // Security subsystem
    ("lsass", Criticality::Critical),
    // Window composition
    ("dwm", Criticality::Critical),
    // Unix init and session management
    ("init", Criticality::Critical),
    ("systemd", Criticality::Critical),
    ("systemd-logind", Criticality::Critical),
    ("launchd", Criticality::Critical),
    ("kernel_task", Criticality::Critical),
    ("loginwindow", Criticality::Critical),
    ("WindowServer", Criticality::Critical),
    // Desktop shells restart on their own
    ("explorer", Criticality::ExplicitlyAllowed),
    ("Finder", Criticality::ExplicitlyAllowed),
];

fn table_entry(name: &str) -> Option<Criticality> {
    PROCESS_TABLE
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, criticality)| *criticality)
}

/// Look a name up in the table, trying it as given, with `.exe` appended and
/// with `.exe` stripped.
pub fn lookup(name: &str) -> Criticality {
    table_entry(name)
        .or_else(|| table_entry(&format!("{}{}", name, EXE_SUFFIX)))
        .or_else(|| name.strip_suffix(EXE_SUFFIX).and_then(table_entry))
        .unwrap_or(Criticality::Unlisted)
}

/// Classify a process name: table lookup first, then the service-host prefix
/// rule for names the table does not mention.
pub fn classify(name: &str) -> Criticality {
    match lookup(name) {
        Criticality::Unlisted if name.to_lowercase().starts_with(SERVICE_HOST_PREFIX) => {
            Criticality::Critical
        }
        other => other,
    }
}

/// Whether a process with this name must not be killed.
pub fn is_critical(name: &str) -> bool {
    classify(name).is_critical()
}

/// Names the table marks critical.
pub fn critical_names() -> impl Iterator<Item = &'static str> {
    PROCESS_TABLE
        .iter()
        .filter(|(_, c)| c.is_critical())
        .map(|(name, _)| *name)
}
