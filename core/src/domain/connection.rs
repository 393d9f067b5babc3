//! Connection domain models.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProcessInfo;

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Map an OS protocol tag ("tcp", "TCP", "udp6", ...) to a protocol.
    ///
    /// Returns `None` for anything that is neither TCP nor UDP.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "tcp" | "tcp4" | "tcp6" => Some(Protocol::Tcp),
            "udp" | "udp4" | "udp6" => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Canonical connection state.
///
/// States the OS reports that are not in this enumeration are kept verbatim
/// in [`ConnectionState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ConnectionState {
    Listening,
    Established,
    TimeWait,
    CloseWait,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    LastAck,
    Closing,
    Closed,
    Idle,
    Bound,
    Other(String),
}

impl ConnectionState {
    /// Every named state, in display order.
    pub const KNOWN: [ConnectionState; 13] = [
        ConnectionState::Listening,
        ConnectionState::Established,
        ConnectionState::TimeWait,
        ConnectionState::CloseWait,
        ConnectionState::SynSent,
        ConnectionState::SynRecv,
        ConnectionState::FinWait1,
        ConnectionState::FinWait2,
        ConnectionState::LastAck,
        ConnectionState::Closing,
        ConnectionState::Closed,
        ConnectionState::Idle,
        ConnectionState::Bound,
    ];

    /// Map a raw OS status string to its canonical state.
    ///
    /// `LISTEN` becomes `LISTENING`; other known names map to themselves.
    /// Unrecognized strings pass through unchanged.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "LISTEN" => ConnectionState::Listening,
            other => Self::parse(other),
        }
    }

    /// Parse a canonical state name. Case-sensitive; unknown names become
    /// [`ConnectionState::Other`].
    pub fn parse(name: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|state| state.as_str() == name)
            .cloned()
            .unwrap_or_else(|| ConnectionState::Other(name.to_string()))
    }

    /// The canonical name of this state.
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionState::Listening => "LISTENING",
            ConnectionState::Established => "ESTABLISHED",
            ConnectionState::TimeWait => "TIME_WAIT",
            ConnectionState::CloseWait => "CLOSE_WAIT",
            ConnectionState::SynSent => "SYN_SENT",
            ConnectionState::SynRecv => "SYN_RECV",
            ConnectionState::FinWait1 => "FIN_WAIT1",
            ConnectionState::FinWait2 => "FIN_WAIT2",
            ConnectionState::LastAck => "LAST_ACK",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Closed => "CLOSED",
            ConnectionState::Idle => "IDLE",
            ConnectionState::Bound => "BOUND",
            ConnectionState::Other(raw) => raw,
        }
    }

    /// Whether this state appears in `filter`, compared by exact name.
    ///
    /// An empty filter admits every state.
    pub fn admitted_by(&self, filter: &[ConnectionState]) -> bool {
        filter.is_empty() || filter.iter().any(|s| s.as_str() == self.as_str())
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConnectionState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<ConnectionState> for String {
    fn from(state: ConnectionState) -> Self {
        state.as_str().to_string()
    }
}

impl From<String> for ConnectionState {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

// ============================================================================
// RawConnection
// ============================================================================

/// A connection exactly as the OS reported it, before correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConnection {
    /// Protocol tag as reported ("tcp", "UDP", ...).
    pub protocol: String,
    /// Local IP without port; empty when the socket has no bound address.
    pub local_ip: String,
    pub local_port: u16,
    /// Status string as reported ("LISTEN", "ESTABLISHED", ...).
    pub status: String,
    /// Owning process, 0 when unattributed.
    pub pid: u32,
}

impl RawConnection {
    pub fn new(
        protocol: impl Into<String>,
        local_ip: impl Into<String>,
        local_port: u16,
        status: impl Into<String>,
        pid: u32,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            local_ip: local_ip.into(),
            local_port,
            status: status.into(),
            pid,
        }
    }

    pub fn tcp(local_ip: impl Into<String>, local_port: u16, status: impl Into<String>, pid: u32) -> Self {
        Self::new("TCP", local_ip, local_port, status, pid)
    }

    pub fn udp(local_ip: impl Into<String>, local_port: u16, pid: u32) -> Self {
        Self::new("UDP", local_ip, local_port, "BOUND", pid)
    }
}

// ============================================================================
// ConnectionEntry
// ============================================================================

/// A connection joined with a snapshot of its owning process.
///
/// Equality and hashing ignore `uptime`, which depends on when the entry was
/// resolved. Two scans of an unchanged system compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub protocol: Protocol,
    /// `host:port`, IPv6 hosts in brackets.
    pub local_address: String,
    pub port: u16,
    pub pid: u32,
    pub process_name: String,
    pub parent_pid: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime: Duration,
    pub exe_path: String,
    pub state: ConnectionState,
    /// Classifier verdict on `process_name` at scan time. Informational only.
    pub protected: bool,
}

impl ConnectionEntry {
    /// Join connection fields with a resolved process snapshot.
    pub fn new(
        protocol: Protocol,
        local_ip: &str,
        port: u16,
        state: ConnectionState,
        process: &ProcessInfo,
        protected: bool,
    ) -> Self {
        let host = if local_ip.is_empty() { "0.0.0.0" } else { local_ip };

        Self {
            protocol,
            local_address: join_host_port(host, port),
            port,
            pid: process.pid,
            process_name: process.name.clone(),
            parent_pid: process.parent_pid,
            started_at: process.started_at,
            uptime: process.uptime,
            exe_path: process.exe_path.clone(),
            state,
            protected,
        }
    }
}

impl PartialEq for ConnectionEntry {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol
            && self.local_address == other.local_address
            && self.port == other.port
            && self.pid == other.pid
            && self.process_name == other.process_name
            && self.parent_pid == other.parent_pid
            && self.started_at == other.started_at
            && self.exe_path == other.exe_path
            && self.state == other.state
            && self.protected == other.protected
    }
}

impl Eq for ConnectionEntry {}

impl Hash for ConnectionEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocol.hash(state);
        self.local_address.hash(state);
        self.port.hash(state);
        self.pid.hash(state);
        self.process_name.hash(state);
        self.parent_pid.hash(state);
        self.started_at.hash(state);
        self.exe_path.hash(state);
        self.state.hash(state);
        self.protected.hash(state);
    }
}

impl std::fmt::Display for ConnectionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} (PID: {}, Process: {})",
            self.protocol, self.local_address, self.state, self.pid, self.process_name
        )
    }
}

/// Combine host and port into `host:port`, bracketing IPv6 hosts.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
