//! Configuration management for escalation timings.
//!
//! Stores settings in JSON format at `~/.haltkit/config.json`.
//! Every key is optional; missing keys fall back to the built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::adapters::DEFAULT_ACTIVATION_MESSAGE;
use crate::domain::EscalationPolicy;
use crate::error::{Error, Result};

/// Escalation settings stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// How long a forced abort waits for the worker to unwind, in milliseconds.
    #[serde(default = "default_abort_grace_ms")]
    pub abort_grace_ms: u64,

    /// Wait between two rounds of a process-tree sweep, in milliseconds.
    #[serde(default = "default_round_wait_ms")]
    pub round_wait_ms: u64,

    /// How often the caller polls the controller's control thread, in milliseconds.
    #[serde(default = "default_control_poll_ms")]
    pub control_poll_ms: u64,

    /// Rounds used by `reap_descendants` when none are given.
    #[serde(default = "default_reap_rounds")]
    pub reap_rounds: u32,

    /// Window message name used by the activation broadcast.
    #[serde(default = "default_activation_message")]
    pub activation_message: String,
}

fn default_abort_grace_ms() -> u64 {
    50
}

fn default_round_wait_ms() -> u64 {
    250
}

fn default_control_poll_ms() -> u64 {
    500
}

fn default_reap_rounds() -> u32 {
    3
}

fn default_activation_message() -> String {
    DEFAULT_ACTIVATION_MESSAGE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            abort_grace_ms: default_abort_grace_ms(),
            round_wait_ms: default_round_wait_ms(),
            control_poll_ms: default_control_poll_ms(),
            reap_rounds: default_reap_rounds(),
            activation_message: default_activation_message(),
        }
    }
}

impl Settings {
    /// Grace period of `TerminableWorker::force_abort`.
    pub fn abort_grace(&self) -> Duration {
        Duration::from_millis(self.abort_grace_ms)
    }

    /// Wait between sweep rounds.
    pub fn round_wait(&self) -> Duration {
        Duration::from_millis(self.round_wait_ms)
    }

    /// Poll interval of the blocking controller entry points.
    pub fn control_poll(&self) -> Duration {
        Duration::from_millis(self.control_poll_ms)
    }

    /// The reap policy described by these settings.
    pub fn escalation_policy(&self) -> Result<EscalationPolicy> {
        EscalationPolicy::new(self.reap_rounds, self.round_wait())
    }

    /// Reject values that cannot drive an escalation.
    pub fn validate(&self) -> Result<()> {
        if self.reap_rounds == 0 {
            return Err(Error::Config("reapRounds must be at least 1".to_string()));
        }
        if self.control_poll_ms == 0 {
            return Err(Error::Config("controlPollMs must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Configuration store for escalation settings.
///
/// Handles reading and writing settings to `~/.haltkit/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.haltkit/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".haltkit").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store().await;
        let settings = store.load().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.abort_grace(), Duration::from_millis(50));
        assert_eq!(settings.round_wait(), Duration::from_millis(250));
        assert_eq!(settings.control_poll(), Duration::from_millis(500));
        assert_eq!(settings.reap_rounds, 3);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store().await;

        let settings = Settings {
            abort_grace_ms: 10,
            round_wait_ms: 20,
            control_poll_ms: 30,
            reap_rounds: 6,
            activation_message: "WM_WAKEUP".to_string(),
        };

        store.save(&settings).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, settings);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store().await;
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{ "reapRounds": 5 }"#).unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.reap_rounds, 5);
        assert_eq!(loaded.abort_grace_ms, 50);
        assert_eq!(loaded.activation_message, "WM_SHOWME");
    }

    #[tokio::test]
    async fn test_zero_rounds_rejected() {
        let (store, _dir) = test_store().await;
        let settings = Settings {
            reap_rounds: 0,
            ..Settings::default()
        };
        assert!(matches!(store.save(&settings).await, Err(Error::Config(_))));
    }

    #[test]
    fn test_escalation_policy_from_settings() {
        let policy = Settings::default().escalation_policy().unwrap();
        assert_eq!(policy.rounds(), 3);
        assert_eq!(policy.round_wait(), Duration::from_millis(250));
    }
}
