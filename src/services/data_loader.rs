//! Loader for revenue exports saved from the dashboard
//!
//! Reads every JSON export matching a glob under a directory. Files are
//! parsed in parallel; the result keeps file-path order, then in-file order.

use crate::services::payload::parse_metrics;
use crate::types::{ChargestatError, DailyMetric, DateRange, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Default export file pattern
pub const DEFAULT_PATTERN: &str = "**/*.json";

/// Result of loading exports
#[derive(Debug)]
pub struct LoadResult {
    pub metrics: Vec<DailyMetric>,
    /// Files that parsed successfully
    pub loaded_files: Vec<PathBuf>,
    /// Files skipped with the reason
    pub skipped_files: Vec<(PathBuf, String)>,
}

pub struct DataLoaderService {
    data_dir: PathBuf,
    pattern: String,
}

impl DataLoaderService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Read and decode a single export file
    pub fn load_file(path: &Path) -> Result<Vec<DailyMetric>> {
        let mut bytes = fs::read(path)?;
        parse_metrics(&mut bytes)
    }

    /// Load all matching exports, optionally keeping only rows inside `range`.
    /// A file that fails to parse is skipped with a warning.
    pub fn load(&self, range: Option<&DateRange>) -> Result<LoadResult> {
        if !self.data_dir.is_dir() {
            return Err(ChargestatError::InvalidArgument(format!(
                "not a directory: {}",
                self.data_dir.display()
            )));
        }

        let files = self.collect_files()?;
        tracing::debug!(count = files.len(), dir = %self.data_dir.display(), "export files found");

        let parsed: Vec<(PathBuf, Result<Vec<DailyMetric>>)> = files
            .into_par_iter()
            .map(|f| {
                let result = Self::load_file(&f);
                (f, result)
            })
            .collect();

        let mut metrics = Vec::new();
        let mut loaded_files = Vec::new();
        let mut skipped_files = Vec::new();

        for (path, result) in parsed {
            match result {
                Ok(rows) => {
                    metrics.extend(rows);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping export");
                    skipped_files.push((path, e.to_string()));
                }
            }
        }

        if let Some(range) = range {
            metrics = range.filter(&metrics);
        }

        Ok(LoadResult {
            metrics,
            loaded_files,
            skipped_files,
        })
    }

    /// Matching files sorted by path
    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.data_dir.join(&self.pattern);
        let paths = glob::glob(&pattern.to_string_lossy()).map_err(|e| {
            ChargestatError::InvalidArgument(format!("bad pattern '{}': {}", self.pattern, e))
        })?;

        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }
}
