//! PortExec CLI - Inspect and kill processes on network ports
//!
//! A command-line tool for listing connections with their owning processes
//! and terminating those processes without touching critical system ones.

mod commands;
mod format;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use portexec_core::{ConfigStore, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portexec")]
#[command(author, version, about = "Inspect and kill processes on network ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List connections and their owning processes
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        port: Option<u16>,

        /// Only show listening sockets
        #[arg(short, long)]
        listen: bool,

        /// Only show connections in this state (repeatable)
        #[arg(short, long = "state", value_name = "STATE")]
        states: Vec<String>,

        /// Filter by process name (case-insensitive substring)
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Filter by PID
        #[arg(long)]
        pid: Option<String>,

        /// Show executable paths
        #[arg(short, long)]
        path: bool,
    },

    /// Kill the processes bound to a port
    Kill {
        /// Port number
        port: u16,

        /// Skip the critical-process check and kill immediately
        #[arg(short, long)]
        force: bool,
    },

    /// Kill a process by PID
    KillPid {
        /// Process ID
        pid: u32,

        /// Only kill if the process still has this name
        #[arg(short, long, value_name = "NAME")]
        expect: Option<String>,

        /// Skip the critical-process check and kill immediately
        #[arg(short, long)]
        force: bool,
    },

    /// Check whether a process's metadata is readable
    Access {
        /// Process ID
        pid: u32,
    },

    /// Check whether running with administrator/root privileges
    Check,

    /// Show or change the configuration
    Config {
        /// Write the configuration file with current values
        #[arg(long)]
        init: bool,

        /// Set the states `list` shows by default (comma-separated)
        #[arg(long, value_delimiter = ',')]
        states: Option<Vec<String>>,

        /// Set whether `list` shows executable paths by default
        #[arg(long)]
        show_paths: Option<bool>,

        /// Set the default log level
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let store = ConfigStore::new()?;
    let settings = store.load().await.unwrap_or_else(|e| {
        eprintln!("warning: ignoring unreadable config: {}", e);
        Settings::default()
    });

    init_logging(cli.verbose, &settings.log_level);

    let code = match cli.command {
        Some(Commands::List {
            port,
            listen,
            states,
            name,
            pid,
            path,
        }) => {
            let args = commands::list::ListArgs {
                port,
                listen,
                states,
                name,
                pid,
                show_paths: path || settings.show_paths,
                json: cli.json,
            };
            commands::list::run(args, &settings).await?
        }
        Some(Commands::Kill { port, force }) => commands::kill::run(port, force, cli.json).await?,
        Some(Commands::KillPid { pid, expect, force }) => {
            commands::kill::run_pid(pid, expect, force, cli.json).await?
        }
        Some(Commands::Access { pid }) => commands::access::run(pid, cli.json).await?,
        Some(Commands::Check) => commands::check::run(cli.json).await?,
        Some(Commands::Config {
            init,
            states,
            show_paths,
            log_level,
        }) => {
            let update = commands::config::ConfigUpdate {
                states,
                show_paths,
                log_level,
            };
            commands::config::show(&store, init, update, cli.json).await?
        }
        None => {
            let args = commands::list::ListArgs {
                show_paths: settings.show_paths,
                json: cli.json,
                ..Default::default()
            };
            commands::list::run(args, &settings).await?
        }
    };

    Ok(code)
}

/// Log to stderr. `RUST_LOG` wins, then `--verbose`, then the config file.
fn init_logging(verbose: bool, config_level: &str) {
    let level = if verbose { "debug" } else { config_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
