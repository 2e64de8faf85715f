//! Fetch cache for daily revenue rows
//!
//! Keeps the last response per (source, range) so repeated reports over
//! the same period do not hit the backend again until the TTL runs out.
//! A source is the full endpoint URL plus the caller's token, so rows
//! fetched from one backend or for one account are never served to another.

use crate::services::config::Config;
use crate::types::{CacheWarning, ChargestatError, DailyMetric, DateRange, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Hex chars of the source digest used in file names
const SOURCE_ID_LEN: usize = 16;

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Where cached rows came from. Only a digest of the token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSource {
    pub url: String,
    token_digest: Option<String>,
}

impl CacheSource {
    pub fn new(url: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            url: url.into(),
            token_digest: token.map(sha256_hex),
        }
    }

    /// Stable identifier for file names
    pub fn id(&self) -> String {
        let material = format!("{}\n{}", self.url, self.token_digest.as_deref().unwrap_or(""));
        let mut id = sha256_hex(&material);
        id.truncate(SOURCE_ID_LEN);
        id
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsCache {
    pub source: CacheSource,
    /// Unix timestamp when the rows were fetched
    pub fetched_at: i64,
    pub metrics: Vec<DailyMetric>,
}

impl MetricsCache {
    pub fn is_expired(&self, now: i64, ttl_secs: i64) -> bool {
        now - self.fetched_at > ttl_secs
    }
}

pub struct MetricsCacheService {
    cache_dir: PathBuf,
    ttl_secs: i64,
}

impl MetricsCacheService {
    pub fn new(ttl_secs: i64) -> Result<Self> {
        let cache_dir = Config::home_dir()
            .map_err(|e| ChargestatError::Cache(e.to_string()))?
            .join("cache");
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            ttl_secs,
        })
    }

    pub fn with_cache_dir(cache_dir: PathBuf, ttl_secs: i64) -> Self {
        Self {
            cache_dir,
            ttl_secs,
        }
    }

    /// One file per source and range, e.g. `revenue_3f2a9c0d1e4b5a67_20240101-20240131.json`
    pub fn cache_path(&self, source: &CacheSource, range: &DateRange) -> PathBuf {
        self.cache_dir.join(format!("revenue_{}_{}.json", source.id(), range.cache_key()))
    }

    /// Cached rows if present and fresh. Any problem is reported as a warning
    /// and treated as a miss.
    pub fn load(
        &self,
        source: &CacheSource,
        range: &DateRange,
    ) -> (Option<Vec<DailyMetric>>, Option<CacheWarning>) {
        let path = self.cache_path(source, range);
        if !path.exists() {
            return (None, None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                return (
                    None,
                    Some(CacheWarning::LoadFailed(format!(
                        "Failed to open cache: {}",
                        e
                    ))),
                );
            }
        };

        if let Err(e) = file.lock_shared() {
            return (
                None,
                Some(CacheWarning::LoadFailed(format!(
                    "Failed to acquire read lock: {}",
                    e
                ))),
            );
        }

        let mut content = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut content);
        let _ = file.unlock();

        if let Err(e) = read {
            return (
                None,
                Some(CacheWarning::LoadFailed(format!(
                    "Failed to read cache: {}",
                    e
                ))),
            );
        }

        let cache: MetricsCache = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                return (
                    None,
                    Some(CacheWarning::Corrupted(format!(
                        "Corrupted cache file: {}",
                        e
                    ))),
                );
            }
        };

        if cache.source != *source {
            return (
                None,
                Some(CacheWarning::LoadFailed(format!(
                    "Cache file {} belongs to another source",
                    path.display()
                ))),
            );
        }

        if cache.is_expired(chrono::Utc::now().timestamp(), self.ttl_secs) {
            return (
                None,
                Some(CacheWarning::Expired(format!(
                    "Cache for {} {} is older than {}s",
                    source.url, range, self.ttl_secs
                ))),
            );
        }

        (Some(cache.metrics), None)
    }

    /// Save using atomic write (temp file + rename) with exclusive lock.
    pub fn save(
        &self,
        source: &CacheSource,
        range: &DateRange,
        metrics: &[DailyMetric],
    ) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let cache = MetricsCache {
            source: source.clone(),
            fetched_at: chrono::Utc::now().timestamp(),
            metrics: metrics.to_vec(),
        };

        let content = serde_json::to_string_pretty(&cache)
            .map_err(|e| ChargestatError::Cache(format!("Serialization failed: {}", e)))?;

        let path = self.cache_path(source, range);
        let temp_path = path.with_extension("json.tmp");

        {
            let mut file = File::create(&temp_path).map_err(|e| {
                ChargestatError::Cache(format!("Failed to create temp file: {}", e))
            })?;
            file.write_all(content.as_bytes()).map_err(|e| {
                ChargestatError::Cache(format!("Failed to write temp file: {}", e))
            })?;
            file.sync_all().map_err(|e| {
                ChargestatError::Cache(format!("Failed to sync temp file: {}", e))
            })?;
        }

        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        target
            .lock_exclusive()
            .map_err(|e| ChargestatError::Cache(format!("Failed to acquire write lock: {}", e)))?;

        fs::rename(&temp_path, &path)
            .map_err(|e| ChargestatError::Cache(format!("Failed to rename temp file: {}", e)))?;

        let _ = target.unlock();
        tracing::debug!(path = %path.display(), rows = metrics.len(), "cache saved");
        Ok(())
    }

    pub fn clear(&self, source: &CacheSource, range: &DateRange) -> Result<()> {
        let path = self.cache_path(source, range);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
