//! Configuration settings for vetbox.
//!
//! Settings are loaded from `~/.vetbox/config.yaml`. Every field has a
//! default, so a partial file (or none at all) is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::VetboxError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Clinic server settings.
    pub server: ServerConfig,
    /// Outbox queue settings.
    pub outbox: OutboxConfig,
    /// Backoff for blocked drains.
    pub retry: RetryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    pub default_output: OutputFormat,
}

/// Clinic server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL relative endpoints are resolved against.
    pub base_url: String,
    /// Default per-request timeout in milliseconds. `0` disables it.
    pub timeout_ms: u64,
    /// Timeout for the connectivity probe in milliseconds.
    pub probe_timeout_ms: u64,
}

/// Outbox queue settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutboxConfig {
    /// Storage key the queue is persisted under.
    pub storage_key: String,
    /// How often `watch` polls connectivity, in seconds.
    pub poll_interval_secs: u64,
}

/// Retry backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first re-drain after a blocked pass.
    pub base_delay_secs: u64,
    /// Multiplier applied per consecutive blocked pass.
    pub multiplier: f64,
    /// Upper bound for the delay.
    pub max_delay_secs: u64,
}

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default storage key for the queue.
pub const DEFAULT_STORAGE_KEY: &str = "vetbox.offlineQueue";

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Pretty,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            probe_timeout_ms: 1500,
        }
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            poll_interval_secs: 5,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 5,
            multiplier: 2.0,
            max_delay_secs: 300,
        }
    }
}

impl ServerConfig {
    /// The default request timeout, `None` when disabled.
    #[must_use]
    pub const fn default_timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, VetboxError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            VetboxError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            VetboxError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), VetboxError> {
        let contents = serde_yaml::to_string(self)?;

        std::fs::write(path, contents).map_err(|e| {
            VetboxError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }
}
