//! Services for loading, aggregating and rendering revenue data

pub mod aggregator;
pub mod api_client;
pub mod cache;
pub mod config;
pub mod data_loader;
pub mod payload;
pub mod report;

pub use aggregator::Aggregator;
pub use api_client::ApiClient;
pub use cache::{CacheSource, MetricsCacheService};
pub use config::Config;
pub use data_loader::DataLoaderService;
pub use payload::parse_metrics;
