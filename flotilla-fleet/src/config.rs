//! Configuration loading for the fleet coordinator.
//!
//! Configuration is loaded from a TOML file (default: `fleet.toml`).

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Coordinator-side fleet configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    /// Milliseconds between worker liveness pings (default: 60000).
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Seconds to wait for an agent to confirm a worker creation batch
    /// (default: 60).
    #[serde(default = "default_worker_startup_timeout_secs")]
    pub worker_startup_timeout_secs: u64,
}

// Default value functions
fn default_ping_interval_ms() -> u64 {
    60_000 // 1 minute
}

fn default_worker_startup_timeout_secs() -> u64 {
    60
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: default_ping_interval_ms(),
            worker_startup_timeout_secs: default_worker_startup_timeout_secs(),
        }
    }
}

impl FleetConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// The worker startup timeout as a [`Duration`].
    pub fn worker_startup_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_startup_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
