//! Configuration settings for ticker-sync.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables overriding file settings,
/// e.g. `TICKER_SYNC__REMOTE__BASE_URL`.
pub const ENV_PREFIX: &str = "TICKER_SYNC";

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote source configuration.
    pub remote: RemoteConfig,
    /// Synchronization configuration.
    pub sync: SyncConfig,
    /// Local mirror configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load_or_default() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration from a TOML file (if present) layered under
    /// environment overrides.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        Self::load_layered(path, None)
    }

    /// Like [`Config::load`], reading overrides from `env` instead of the
    /// process environment when given.
    fn load_layered(
        path: Option<PathBuf>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let config_path = path.unwrap_or_else(default_config_path);

        let mut builder = config::Config::builder();
        if config_path.exists() {
            builder = builder.add_source(
                config::File::from(config_path.as_path()).format(config::FileFormat::Toml),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder
            .build()
            .and_then(|layered| layered.try_deserialize())
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = path.unwrap_or_else(default_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    super::config_dir()
        .map(|p| p.join("config.toml"))
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Remote source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// REST API base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Synchronization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quote polling period in seconds.
    pub poll_interval_secs: u64,
    /// Start and stop the poll schedule with tracked-set membership.
    pub auto_poll: bool,
}

impl SyncConfig {
    /// Polling period, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            auto_poll: true,
        }
    }
}

/// Local mirror configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Mirror file path. Defaults to `tracked.json` in the data directory.
    pub mirror_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the mirror file path.
    pub fn resolve_mirror_path(&self) -> PathBuf {
        self.mirror_path.clone().unwrap_or_else(|| {
            super::data_dir()
                .map(|p| p.join("tracked.json"))
                .unwrap_or_else(|_| Path::new("tracked.json").to_path_buf())
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Also write a daily-rolling log file into the log directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "ticker_sync=info".to_string(),
            file: false,
        }
    }
}
