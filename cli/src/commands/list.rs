//! List command - show connections and their owning processes.

use std::process::ExitCode;

use anyhow::Result;
use portexec_core::{filter_entries, ConnectionState, FilterCriteria, PortExec, Settings};

use crate::format::{format_uptime, truncate};

#[derive(Debug, Default)]
pub struct ListArgs {
    pub port: Option<u16>,
    pub listen: bool,
    pub states: Vec<String>,
    pub name: Option<String>,
    pub pid: Option<String>,
    pub show_paths: bool,
    pub json: bool,
}

pub async fn run(args: ListArgs, settings: &Settings) -> Result<ExitCode> {
    let core = PortExec::new();

    let mut entries = core.scanner().scan(&state_filter(&args, settings)).await?;

    if let Some(port) = args.port {
        entries.retain(|e| e.port == port);
    }
    let criteria = FilterCriteria {
        port: None,
        process_name: args.name,
        pid: args.pid,
    };
    if !criteria.is_empty() {
        entries = filter_entries(&entries, &criteria);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(ExitCode::SUCCESS);
    }

    if entries.is_empty() {
        println!("No connections found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "  {:<5} {:<6} {:<8} {:<20} {:<12} {:<8} ADDRESS",
        "PROTO", "PORT", "PID", "PROCESS", "STATE", "UPTIME"
    );
    println!("{}", "-".repeat(88));

    for entry in &entries {
        let marker = if entry.protected { '*' } else { ' ' };
        println!(
            "{} {:<5} {:<6} {:<8} {:<20} {:<12} {:<8} {}",
            marker,
            entry.protocol.as_str(),
            entry.port,
            entry.pid,
            truncate(&entry.process_name, 20),
            truncate(entry.state.as_str(), 12),
            format_uptime(entry.uptime),
            entry.local_address
        );
        if args.show_paths && !entry.exe_path.is_empty() {
            println!("  {:<5} {}", "", entry.exe_path);
        }
    }

    println!("\nTotal: {} connections", entries.len());
    if entries.iter().any(|e| e.protected) {
        println!("* critical system process (protected from kill)");
    }
    Ok(ExitCode::SUCCESS)
}

/// `--listen`, then `--state`, then all states when a port is given, then
/// the configured defaults.
fn state_filter(args: &ListArgs, settings: &Settings) -> Vec<ConnectionState> {
    if args.listen {
        vec![ConnectionState::Listening]
    } else if !args.states.is_empty() {
        args.states
            .iter()
            .map(|s| ConnectionState::parse(&s.to_uppercase()))
            .collect()
    } else if args.port.is_some() {
        Vec::new()
    } else {
        settings.state_filter()
    }
}
