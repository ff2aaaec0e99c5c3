//! Configuration loading
//!
//! Settings resolve in priority order: command-line argument (applied by the
//! binary), environment variable (also applied by the binary via clap),
//! TOML config file, compiled default. The config file lives at
//! `<config_dir>/beats-interaction/config.toml` unless an explicit path is
//! given.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Broker connection and topic settings
    pub broker: BrokerConfig,
}

/// Broker connection and topic settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Gates the projection pipeline and projection-dependent health checks
    pub enabled: bool,
    /// Bootstrap broker list, host:port comma-separated
    pub brokers: String,
    /// Consumer group id
    pub group_id: String,
    /// Inbound track events topic
    pub beat_events_topic: String,
    /// Inbound user events topic
    pub user_events_topic: String,
    /// Outbound dead-letter topic
    pub dead_letter_topic: String,
    /// Outbound domain events topic
    pub social_events_topic: String,
    /// Connection attempts before entering cooldown
    pub connect_attempts: u32,
    /// Fixed delay between connection attempts, in seconds
    pub retry_delay_secs: u64,
    /// Sleep after exhausting connection attempts, in seconds
    pub cooldown_secs: u64,
    /// Timeout for metadata queries (probe and connect verification), in seconds
    pub metadata_timeout_secs: u64,
    /// Delivery timeout for produced messages, in seconds
    pub publish_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            broker: BrokerConfig::default(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            brokers: "127.0.0.1:9092".to_string(),
            group_id: "beats-interaction".to_string(),
            beat_events_topic: "beats-events".to_string(),
            user_events_topic: "users-events".to_string(),
            dead_letter_topic: "beats-interaction-dlq".to_string(),
            social_events_topic: "social-events".to_string(),
            connect_attempts: 5,
            retry_delay_secs: 5,
            cooldown_secs: 60,
            metadata_timeout_secs: 10,
            publish_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// With an explicit path the file must exist and parse. Without one, the
    /// platform config location is tried and silently skipped if absent.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            if required {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default config file path for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("beats-interaction").join("config.toml"))
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("beats-interaction"))
        .unwrap_or_else(|| PathBuf::from("./beats-interaction_data"))
        .join("interaction.db")
}
