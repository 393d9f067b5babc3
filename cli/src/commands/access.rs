//! Access command - check whether a process can be inspected.

use std::process::ExitCode;

use anyhow::Result;
use portexec_core::PortExec;

pub async fn run(pid: u32, json: bool) -> Result<ExitCode> {
    let core = PortExec::new();
    let check = core.guard().check_access(pid).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else if check.allowed {
        println!("Process {}: accessible", pid);
    } else {
        println!("Process {}: not accessible ({})", pid, check.reason);
    }

    Ok(if check.allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
