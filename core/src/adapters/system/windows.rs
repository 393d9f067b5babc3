//! Windows implementation using netstat, taskkill and net session.
#![cfg_attr(not(windows), allow(dead_code))]

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::RawConnection;
use crate::error::{Error, Result};

use super::utils::split_endpoint;
use super::ConnectionSource;

/// Connection source backed by `netstat -ano`.
pub struct NetstatSource;

impl NetstatSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NetstatSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for NetstatSource {
    async fn connections(&self) -> Result<Vec<RawConnection>> {
        let output = Command::new("netstat")
            .args(["-ano"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("netstat -ano: {}", e)))?;

        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "netstat -ano failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_netstat_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse the output of `netstat -ano`.
///
/// ```text
/// Active Connections
///
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
///   TCP    [::1]:6379             [::]:0                 LISTENING       8080
///   UDP    0.0.0.0:5353           *:*                                    2345
/// ```
///
/// UDP rows have no state column and are reported as `BOUND`.
pub fn parse_netstat_output(output: &str) -> Vec<RawConnection> {
    let mut connections = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();

        let (protocol, local, status, pid) = match parts.as_slice() {
            [proto, local, _foreign, state, pid] if proto.eq_ignore_ascii_case("tcp") => {
                (*proto, *local, translate_state(state), *pid)
            }
            [proto, local, _foreign, pid] if proto.eq_ignore_ascii_case("udp") => {
                (*proto, *local, "BOUND", *pid)
            }
            _ => continue,
        };

        let Ok(pid) = pid.parse::<u32>() else {
            continue;
        };
        let Some((local_ip, local_port)) = split_endpoint(local) else {
            continue;
        };

        connections.push(RawConnection::new(protocol, local_ip, local_port, status, pid));
    }

    connections
}

fn translate_state(state: &str) -> &str {
    match state {
        "SYN_RECEIVED" => "SYN_RECV",
        "FIN_WAIT_1" => "FIN_WAIT1",
        "FIN_WAIT_2" => "FIN_WAIT2",
        other => other,
    }
}

/// Request termination with `taskkill /PID` (WM_CLOSE).
pub async fn terminate(pid: u32) -> Result<()> {
    taskkill(pid, false).await
}

/// Terminate with `taskkill /PID /F` (TerminateProcess).
pub async fn force_terminate(pid: u32) -> Result<()> {
    taskkill(pid, true).await
}

async fn taskkill(pid: u32, force: bool) -> Result<()> {
    debug!(pid = pid, force = force, "Executing taskkill");

    let mut cmd = Command::new("taskkill");
    cmd.arg("/PID").arg(pid.to_string());
    if force {
        cmd.arg("/F");
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| Error::CommandFailed(format!("taskkill: {}", e)))?;

    if output.status.success() {
        debug!(pid = pid, force = force, "taskkill succeeded");
        return Ok(());
    }

    let combined = format!(
        "{} {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    taskkill_outcome(pid, combined.trim())
}

/// Map a failed taskkill's output to an error.
fn taskkill_outcome(pid: u32, output: &str) -> Result<()> {
    if output.contains("not found") || output.contains("could not be found") {
        debug!(pid = pid, "Process not found");
        return Err(Error::NotFound(pid));
    }

    if output.contains("Access is denied") || output.contains("access denied") {
        warn!(pid = pid, "Access denied to kill process");
        return Err(Error::PermissionDenied(output.to_string()));
    }

    if output.contains("already been terminated") || output.contains("has exited") {
        debug!(pid = pid, "Process already terminated");
        return Err(Error::NotFound(pid));
    }

    Err(Error::KillFailed {
        pid,
        reason: output.to_string(),
    })
}

/// `net session` only succeeds for administrators.
pub async fn is_elevated() -> bool {
    Command::new("net")
        .arg("session")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
