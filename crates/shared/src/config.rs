//! Configuration management for the Pokédex tools.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// PokeAPI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint that ids are appended to (`{base_url}/{id}`)
    pub base_url: String,

    /// First catalog id (inclusive)
    pub first_id: u32,

    /// Last catalog id (inclusive)
    pub last_id: u32,

    /// Cap on in-flight requests (None = one task per id, unbounded)
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,

    /// Request timeout in seconds (None = transport default)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// User agent sent with every request
    pub user_agent: String,

    /// Reject entries without `sprites.front_default`
    pub require_thumbnail: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root_dir: "data".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2/pokemon".to_string(),
            first_id: 1,
            last_id: 151,
            max_concurrent_requests: None,
            timeout_seconds: None,
            user_agent: "Pokedex/0.1.0".to_string(),
            require_thumbnail: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Ids making up the catalog
    pub fn catalog_ids(&self) -> RangeInclusive<u32> {
        self.first_id..=self.last_id
    }

    /// Number of entries in the catalog range
    pub fn catalog_size(&self) -> usize {
        if self.last_id < self.first_id {
            0
        } else {
            (self.last_id - self.first_id) as usize + 1
        }
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Check the settings that would make a fetch meaningless
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("api.base_url must not be empty");
        }
        if self.catalog_size() == 0 {
            bail!(
                "api catalog range is empty: first_id {} > last_id {}",
                self.first_id,
                self.last_id
            );
        }
        if self.max_concurrent_requests == Some(0) {
            bail!("api.max_concurrent_requests must be at least 1 when set");
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .api
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the absolute path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the absolute path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        let log_path = Path::new(&self.logging.log_dir);
        if log_path.is_absolute() {
            log_path.to_path_buf()
        } else {
            self.data_dir().join(log_path)
        }
    }
}
