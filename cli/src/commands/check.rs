//! Check command - report whether we run elevated.

use std::process::ExitCode;

use anyhow::Result;
use portexec_core::PortExec;

pub async fn run(json: bool) -> Result<ExitCode> {
    let core = PortExec::new();
    let elevated = core.guard().is_elevated().await;

    if json {
        println!("{}", serde_json::json!({ "elevated": elevated }));
    } else if elevated {
        println!("Running with administrator/root privileges");
    } else {
        println!("Not elevated; processes owned by other users cannot be killed");
    }

    Ok(if elevated {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
