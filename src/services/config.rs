//! User configuration (~/.chargestat/config.json)

use crate::types::{ChargestatError, Granularity, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_REVENUE_ENDPOINT: &str = "/api/analytics/revenue";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub revenue_endpoint: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: i64,
    pub default_granularity: Granularity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            revenue_endpoint: DEFAULT_REVENUE_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            default_granularity: Granularity::default(),
        }
    }
}

impl Config {
    /// Load from the default location; defaults if the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ChargestatError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            ChargestatError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Base directory for config and cache (~/.chargestat)
    pub fn home_dir() -> Result<PathBuf> {
        let home = directories::UserDirs::new()
            .ok_or_else(|| ChargestatError::Config("Failed to get home directory".into()))?
            .home_dir()
            .to_path_buf();
        Ok(home.join(".chargestat"))
    }

    fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ChargestatError::Config("api_base_url is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ChargestatError::Config("timeout_secs must be positive".into()));
        }
        if self.cache_ttl_secs < 0 {
            return Err(ChargestatError::Config(
                "cache_ttl_secs must not be negative".into(),
            ));
        }
        Ok(())
    }
}
