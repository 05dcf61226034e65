// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::HarvestSource;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetching behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Import stage settings
    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Catalogs to harvest
    #[serde(default)]
    pub sources: Vec<HarvestSource>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::config("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::config("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.max_bytes == 0 {
            return Err(AppError::config("fetcher.max_bytes must be > 0"));
        }
        if self.import.concurrency == 0 {
            return Err(AppError::config("import.concurrency must be > 0"));
        }
        if self.storage.site_user.trim().is_empty() {
            return Err(AppError::config("storage.site_user is empty"));
        }

        let mut ids = std::collections::HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(AppError::config("source id is empty"));
            }
            if source.url.trim().is_empty() {
                return Err(AppError::config(format!("source {} has no url", source.id)));
            }
            if !ids.insert(source.id.as_str()) {
                return Err(AppError::config(format!("duplicate source id {}", source.id)));
            }
            source.parsed_config().map_err(|e| {
                AppError::config(format!("source {}: {}", source.id, e))
            })?;
        }
        Ok(())
    }

    /// Find a configured source by id.
    pub fn source(&self, id: &str) -> Option<&HarvestSource> {
        self.sources.iter().find(|s| s.id == id)
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Read timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum payload size per page
    #[serde(default = "defaults::max_bytes")]
    pub max_bytes: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
            max_bytes: defaults::max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Work items imported at once (distinct guids only)
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// User that harvested records are created as
    #[serde(default = "defaults::site_user")]
    pub site_user: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            site_user: defaults::site_user(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "dcat-harvester/0.1".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn max_bytes() -> u64 {
        50 * 1024 * 1024
    }
    pub fn concurrency() -> usize {
        1
    }
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn site_user() -> String {
        "harvest".into()
    }
}
