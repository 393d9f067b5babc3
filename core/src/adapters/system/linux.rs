//! Linux connection enumeration using ss.
#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;

use crate::domain::RawConnection;
use crate::error::{Error, Result};

use super::utils::split_endpoint;
use super::ConnectionSource;

/// Connection source backed by `ss -Htuanp`.
pub struct SsSource;

impl SsSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSource for SsSource {
    async fn connections(&self) -> Result<Vec<RawConnection>> {
        let output = Command::new("ss")
            .args(["-Htuanp"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ss: {}", e)))?;

        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "ss -Htuanp failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ss output: {}", e)))?;

        parse_ss_output(&stdout)
    }
}

/// Parse `ss -Htuanp` output.
///
/// ```text
/// tcp   LISTEN 0      4096         0.0.0.0:22        0.0.0.0:*    users:(("sshd",pid=812,fd=3))
/// udp   UNCONN 0      0      127.0.0.53%lo:53        0.0.0.0:*    users:(("systemd-resolve",pid=600,fd=13))
/// ```
///
/// A socket shared by several processes yields one connection per PID.
/// Sockets whose owner is not visible get PID 0.
pub fn parse_ss_output(output: &str) -> Result<Vec<RawConnection>> {
    let pid_regex =
        Regex::new(r"pid=(\d+)").map_err(|e| Error::ParseError(format!("Invalid regex: {}", e)))?;

    let mut connections = Vec::new();

    for line in output.lines() {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 5 {
            continue;
        }

        let protocol = components[0];
        let status = translate_state(components[1]);

        let Some((local_ip, local_port)) = split_endpoint(components[4]) else {
            continue;
        };

        let mut pids: Vec<u32> = Vec::new();
        for users in components.iter().skip(6) {
            for caps in pid_regex.captures_iter(users) {
                if let Ok(pid) = caps[1].parse() {
                    if !pids.contains(&pid) {
                        pids.push(pid);
                    }
                }
            }
        }
        if pids.is_empty() {
            pids.push(0);
        }

        for pid in pids {
            connections.push(RawConnection::new(protocol, local_ip.clone(), local_port, status, pid));
        }
    }

    Ok(connections)
}

fn translate_state(state: &str) -> &str {
    match state {
        "ESTAB" => "ESTABLISHED",
        "SYN-SENT" => "SYN_SENT",
        "SYN-RECV" => "SYN_RECV",
        "FIN-WAIT-1" => "FIN_WAIT1",
        "FIN-WAIT-2" => "FIN_WAIT2",
        "TIME-WAIT" => "TIME_WAIT",
        "CLOSE-WAIT" => "CLOSE_WAIT",
        "LAST-ACK" => "LAST_ACK",
        "CLOSE" | "CLOSED" => "CLOSED",
        "UNCONN" => "BOUND",
        other => other,
    }
}
