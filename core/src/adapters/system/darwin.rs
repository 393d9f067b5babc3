//! macOS connection enumeration using lsof.
#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use std::process::Stdio;

use tokio::process::Command;

use crate::domain::RawConnection;
use crate::error::{Error, Result};

use super::utils::split_endpoint;
use super::ConnectionSource;

/// Connection source backed by `lsof -nP -i`.
pub struct LsofSource;

impl LsofSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LsofSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for LsofSource {
    async fn connections(&self) -> Result<Vec<RawConnection>> {
        let output = Command::new("lsof")
            .args(["-nP", "-i"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        // lsof exits with 1 when nothing matched.
        if !output.status.success() && output.status.code() != Some(1) {
            return Err(Error::CommandFailed(format!(
                "lsof -nP -i failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_lsof_output(&stdout))
    }
}

/// Parse `lsof -nP -i` output.
///
/// ```text
/// COMMAND     PID USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
/// node      45123 me     23u  IPv6 0x5c3a9e1f2b7d4a01      0t0  TCP *:3000 (LISTEN)
/// Google    1234  me     25u  IPv4 0x5c3a9e1f2b7d4a02      0t0  TCP 10.0.0.5:50000->1.2.3.4:443 (ESTABLISHED)
/// mDNSRespo   300 _mdns  6u   IPv4 0x5c3a9e1f2b7d4a03      0t0  UDP *:5353
/// ```
pub fn parse_lsof_output(output: &str) -> Vec<RawConnection> {
    let mut connections = Vec::new();

    for line in output.lines().skip(1) {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 9 {
            continue;
        }

        let pid: u32 = match components[1].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let protocol = components[7];
        let local = components[8].split("->").next().unwrap_or(components[8]);
        let Some((local_ip, local_port)) = split_endpoint(local) else {
            continue;
        };

        let status = match components.get(9) {
            Some(state) => translate_state(state.trim_start_matches('(').trim_end_matches(')')),
            None if protocol.eq_ignore_ascii_case("udp") => "BOUND",
            None => "",
        };

        connections.push(RawConnection::new(protocol, local_ip, local_port, status, pid));
    }

    connections
}

fn translate_state(state: &str) -> &str {
    match state {
        "SYN_RCVD" => "SYN_RECV",
        "FIN_WAIT_1" => "FIN_WAIT1",
        "FIN_WAIT_2" => "FIN_WAIT2",
        other => other,
    }
}
