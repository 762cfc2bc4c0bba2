use std::time::Duration;

use serde::Deserialize;

use crate::domain::cache::{
    CachePolicy, DEFAULT_STALE_RETRY_AFTER, DEFAULT_TTL, StaleFallback,
};

/// Application configuration
///
/// Loaded from `config/default`, then `config/local`, then `APP__*`
/// environment variables (e.g. `APP__CACHE__TTL_SECS=60`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub blob: BlobConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Entity and list cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    /// Serve the stale value after a failed refresh
    pub stale_on_error: bool,
    pub stale_retry_after_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub base_url: String,
    pub url_ttl_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            stale_on_error: false,
            stale_retry_after_secs: DEFAULT_STALE_RETRY_AFTER.as_secs(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9199/thumbnails".to_string(),
            url_ttl_secs: 600,
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        let fallback = if self.stale_on_error {
            StaleFallback::enabled(Duration::from_secs(self.stale_retry_after_secs))
        } else {
            StaleFallback::Disabled
        };

        CachePolicy::new()
            .with_ttl(Duration::from_secs(self.ttl_secs))
            .with_stale_fallback(fallback)
    }
}

impl BlobConfig {
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Falls back to the defaults when `loaded` failed, handing back the
    /// error so it can be reported once logging is up
    pub fn or_default(
        loaded: Result<Self, config::ConfigError>,
    ) -> (Self, Option<config::ConfigError>) {
        match loaded {
            Ok(config) => (config, None),
            Err(error) => (Self::default(), Some(error)),
        }
    }
}
