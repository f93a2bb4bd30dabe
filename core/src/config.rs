//! Configuration management for the lobby watcher.
//!
//! Stores configuration in JSON format at `~/.lobbywatch/config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::{PayloadBounds, MAX_PAYLOAD_LEN, MIN_PAYLOAD_LEN};
use crate::error::{Error, Result};

/// Name of the config directory under the home directory.
const CONFIG_DIR_NAME: &str = ".lobbywatch";

/// Name of the ignored user ids file inside the config directory.
const IGNORED_USER_IDS_FILE: &str = "my-user-ids.txt";

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Executable name of the monitored game process.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Seconds between two port enumerations.
    #[serde(default = "default_refresh_interval")]
    pub port_refresh_interval_secs: u64,

    /// Smallest payload considered for decoding.
    #[serde(default = "default_min_payload_len")]
    pub min_payload_len: usize,

    /// Largest payload considered for decoding.
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,

    /// Base URL of the sighting collaborator.
    #[serde(default = "default_notify_url")]
    pub notify_url: String,

    /// Per-request timeout for notifications, in milliseconds.
    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u64,

    /// Events buffered for delivery before new ones are dropped.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,

    /// Packets decoded concurrently.
    #[serde(default = "default_decode_workers")]
    pub decode_workers: usize,

    /// Captured packets buffered before new ones are dropped.
    #[serde(default = "default_capture_queue_capacity")]
    pub capture_queue_capacity: usize,

    /// Capture read timeout, in milliseconds.
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: i32,

    /// File listing the operator's own user ids, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_user_ids_path: Option<PathBuf>,
}

fn default_process_name() -> String {
    "RISK".to_string()
}

fn default_refresh_interval() -> u64 {
    1
}

fn default_min_payload_len() -> usize {
    MIN_PAYLOAD_LEN
}

fn default_max_payload_len() -> usize {
    MAX_PAYLOAD_LEN
}

fn default_notify_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_notify_timeout_ms() -> u64 {
    2000
}

fn default_outbound_queue_capacity() -> usize {
    256
}

fn default_decode_workers() -> usize {
    8
}

fn default_capture_queue_capacity() -> usize {
    4096
}

fn default_capture_timeout_ms() -> i32 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            port_refresh_interval_secs: default_refresh_interval(),
            min_payload_len: default_min_payload_len(),
            max_payload_len: default_max_payload_len(),
            notify_url: default_notify_url(),
            notify_timeout_ms: default_notify_timeout_ms(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            decode_workers: default_decode_workers(),
            capture_queue_capacity: default_capture_queue_capacity(),
            capture_timeout_ms: default_capture_timeout_ms(),
            ignored_user_ids_path: None,
        }
    }
}

impl Config {
    /// Payload size window for the traffic filter.
    pub fn payload_bounds(&self) -> PayloadBounds {
        PayloadBounds::new(self.min_payload_len, self.max_payload_len)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.process_name.trim().is_empty() {
            return Err(Error::Config("processName must not be empty".to_string()));
        }
        if self.min_payload_len > self.max_payload_len {
            return Err(Error::Config(format!(
                "minPayloadLen ({}) exceeds maxPayloadLen ({})",
                self.min_payload_len, self.max_payload_len
            )));
        }
        if self.decode_workers == 0 {
            return Err(Error::Config("decodeWorkers must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Configuration store for managing app settings.
///
/// Handles reading and writing configuration to `~/.lobbywatch/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.lobbywatch/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_dir = home.join(CONFIG_DIR_NAME);
        let config_path = config_dir.join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the configuration file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Where the ignored user ids live for `config`.
    pub fn ignored_user_ids_path(&self, config: &Config) -> PathBuf {
        config
            .ignored_user_ids_path
            .clone()
            .unwrap_or_else(|| self.config_dir().join(IGNORED_USER_IDS_FILE))
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read(&self.config_path)
            .await
            .map_err(|e| io_failure("read config", e))?;

        let config: Config = serde_json::from_slice(&raw).map_err(|e| {
            Error::Config(format!("{} is not valid: {}", self.config_path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;

        let dir = self.config_dir();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| io_failure("create config directory", e))?;
        }

        let json = serde_json::to_vec_pretty(config)?;

        // Stage, then rename over the live file
        let staging = self.config_path.with_extension("json.tmp");
        let mut file = fs::File::create(&staging)
            .await
            .map_err(|e| io_failure("stage config", e))?;
        file.write_all(&json)
            .await
            .map_err(|e| io_failure("write config", e))?;
        file.sync_all()
            .await
            .map_err(|e| io_failure("flush config", e))?;
        drop(file);

        fs::rename(&staging, &self.config_path)
            .await
            .map_err(|e| io_failure("replace config", e))
    }

    /// Set the monitored process name.
    pub async fn set_process_name(&self, name: &str) -> Result<()> {
        let mut config = self.load().await?;
        config.process_name = name.to_string();
        self.save(&config).await
    }

    /// Set the collaborator base URL.
    pub async fn set_notify_url(&self, url: &str) -> Result<()> {
        let mut config = self.load().await?;
        config.notify_url = url.to_string();
        self.save(&config).await
    }
}

fn io_failure(action: &str, e: std::io::Error) -> Error {
    Error::Config(format!("Failed to {}: {}", action, e))
}

/// The operator's own user ids, which are never tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    user_ids: Vec<String>,
}

impl IgnoreList {
    /// Parse one user id per line, skipping blank lines.
    pub fn parse(content: &str) -> Self {
        Self {
            user_ids: content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Load the list, creating an empty file when it is missing.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            fs::write(path, "").await?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.user_ids
    }
}
