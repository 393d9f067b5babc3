//! Kill commands - terminate processes by port or PID.

use std::process::ExitCode;

use anyhow::Result;
use portexec_core::{KillResult, PortExec};
use serde::Serialize;
use tracing::debug;

const FORCE_WARNING: &str =
    "warning: --force skips the critical-process check; killing a system process can crash the machine";

#[derive(Serialize)]
struct Outcome {
    pid: u32,
    name: Option<String>,
    #[serde(flatten)]
    result: KillResult,
}

pub async fn run(port: u16, force: bool, json: bool) -> Result<ExitCode> {
    let core = PortExec::new();
    let entries = core.scanner().by_port(port).await?;

    let mut targets: Vec<(u32, String)> = Vec::new();
    for entry in entries {
        if !targets.iter().any(|(pid, _)| *pid == entry.pid) {
            targets.push((entry.pid, entry.process_name));
        }
    }

    debug!(port = port, targets = targets.len(), "Resolved kill targets");

    if targets.is_empty() {
        eprintln!("No process found on port {}", port);
        return Ok(ExitCode::FAILURE);
    }

    if force {
        eprintln!("{}", FORCE_WARNING);
    }

    let mut outcomes = Vec::with_capacity(targets.len());
    for (pid, name) in targets {
        let result = if force {
            core.guard().force_kill(pid).await
        } else {
            core.guard().kill_with_verification(pid, &name).await
        };
        outcomes.push(Outcome {
            pid,
            name: Some(name),
            result,
        });
    }

    report(&outcomes, json)
}

pub async fn run_pid(pid: u32, expect: Option<String>, force: bool, json: bool) -> Result<ExitCode> {
    let core = PortExec::new();

    let result = if force {
        eprintln!("{}", FORCE_WARNING);
        core.guard().force_kill(pid).await
    } else if let Some(expected) = &expect {
        core.guard().kill_with_verification(pid, expected).await
    } else {
        core.guard().kill(pid).await
    };

    report(
        &[Outcome {
            pid,
            name: expect,
            result,
        }],
        json,
    )
}

fn report(outcomes: &[Outcome], json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
    } else {
        for outcome in outcomes {
            if outcome.result.success {
                println!("{}", outcome.result.message);
            } else {
                eprintln!("{}", outcome.result.message);
            }
        }
    }

    if outcomes.iter().all(|o| o.result.success) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
