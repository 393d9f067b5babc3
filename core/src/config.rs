//! Persistent user settings.
//!
//! Stores settings in JSON format at `~/.portexec/config.json`. Settings only
//! change presentation defaults; they never affect which processes are
//! protected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::ConnectionState;
use crate::error::{Error, Result};

/// Settings data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// States shown by `list` when no state filter is given.
    #[serde(default = "default_state_names", rename = "defaultStates")]
    pub default_states: Vec<String>,

    /// Show executable paths in listings.
    #[serde(default, rename = "showPaths")]
    pub show_paths: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level", rename = "logLevel")]
    pub log_level: String,
}

fn default_state_names() -> Vec<String> {
    vec![
        ConnectionState::Listening.to_string(),
        ConnectionState::Established.to_string(),
    ]
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_states: default_state_names(),
            show_paths: false,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// The configured default states as a scan filter.
    pub fn state_filter(&self) -> Vec<ConnectionState> {
        self.default_states
            .iter()
            .map(|s| ConnectionState::parse(s))
            .collect()
    }
}

/// Configuration store for reading and writing [`Settings`].
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a config store with the default path.
    ///
    /// Default path: `~/.portexec/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portexec").join("config.json"),
        })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save settings to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Write the current settings (defaults if none exist yet) to disk.
    pub async fn init(&self) -> Result<Settings> {
        let settings = self.load().await?;
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Set the states `list` shows by default.
    pub async fn set_default_states(&self, states: &[ConnectionState]) -> Result<()> {
        let mut settings = self.load().await?;
        settings.default_states = states.iter().map(ToString::to_string).collect();
        self.save(&settings).await
    }

    pub async fn set_show_paths(&self, enabled: bool) -> Result<()> {
        let mut settings = self.load().await?;
        settings.show_paths = enabled;
        self.save(&settings).await
    }

    pub async fn set_log_level(&self, level: &str) -> Result<()> {
        let mut settings = self.load().await?;
        settings.log_level = level.to_string();
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let settings = store.load().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.state_filter(),
            vec![ConnectionState::Listening, ConnectionState::Established]
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store();

        let settings = Settings {
            default_states: vec!["TIME_WAIT".to_string()],
            show_paths: true,
            log_level: "debug".to_string(),
        };
        store.save(&settings).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.state_filter(), vec![ConnectionState::TimeWait]);
    }

    #[tokio::test]
    async fn test_camel_case_keys_and_missing_fields() {
        let (store, dir) = test_store();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"showPaths": true}"#).unwrap();

        let partial = ConfigStore::with_path(path).load().await.unwrap();
        assert!(partial.show_paths);
        assert_eq!(partial.default_states, vec!["LISTENING", "ESTABLISHED"]);
        assert_eq!(partial.log_level, "warn");

        store.init().await.unwrap();
        let written = std::fs::read_to_string(store.config_path()).unwrap();
        assert!(written.contains("defaultStates"));
        assert!(written.contains("logLevel"));
    }

    #[tokio::test]
    async fn test_setters() {
        let (store, _dir) = test_store();

        store.set_show_paths(true).await.unwrap();
        store.set_log_level("info").await.unwrap();
        store
            .set_default_states(&[ConnectionState::Listening])
            .await
            .unwrap();

        let settings = store.load().await.unwrap();
        assert!(settings.show_paths);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.default_states, vec!["LISTENING"]);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let (store, _dir) = test_store();
        std::fs::create_dir_all(store.config_path().parent().unwrap()).unwrap();
        std::fs::write(store.config_path(), "not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
