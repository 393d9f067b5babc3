//! Config command - show or change the configuration.

use std::process::ExitCode;

use anyhow::Result;
use portexec_core::{ConfigStore, ConnectionState};

/// Settings to change before showing the configuration.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub states: Option<Vec<String>>,
    pub show_paths: Option<bool>,
    pub log_level: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.states.is_none() && self.show_paths.is_none() && self.log_level.is_none()
    }
}

pub async fn show(store: &ConfigStore, init: bool, update: ConfigUpdate, json: bool) -> Result<ExitCode> {
    if init {
        store.init().await?;
        eprintln!("Wrote {}", store.config_path().display());
    }
    if !update.is_empty() {
        apply(store, update).await?;
        eprintln!("Updated {}", store.config_path().display());
    }

    let settings = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Config file: {}", store.config_path().display());
    println!("Default states: {}", settings.default_states.join(", "));
    println!("Show paths: {}", settings.show_paths);
    println!("Log level: {}", settings.log_level);
    Ok(ExitCode::SUCCESS)
}

async fn apply(store: &ConfigStore, update: ConfigUpdate) -> Result<()> {
    if let Some(states) = update.states {
        let states: Vec<ConnectionState> = states
            .iter()
            .map(|s| ConnectionState::parse(&s.trim().to_uppercase()))
            .collect();
        store.set_default_states(&states).await?;
    }
    if let Some(enabled) = update.show_paths {
        store.set_show_paths(enabled).await?;
    }
    if let Some(level) = update.log_level {
        store.set_log_level(&level).await?;
    }
    Ok(())
}
