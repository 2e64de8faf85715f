//! Type definitions for chargestat

mod error;
mod metric;
mod period;

pub use error::*;
pub use metric::*;
pub use period::*;

/// Cache loading warning types
#[derive(Debug, Clone, PartialEq)]
pub enum CacheWarning {
    /// Failed to open or read cache file
    LoadFailed(String),
    /// Cache file was corrupted (invalid JSON)
    Corrupted(String),
    /// Cache entry is older than the configured TTL
    Expired(String),
}
