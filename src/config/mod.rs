//! Configuration

mod app_config;

pub use app_config::{AppConfig, BlobConfig, CacheConfig, LogFormat, LoggingConfig};
