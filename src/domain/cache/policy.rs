//! Cache policy configuration

use std::time::Duration;

/// Default time-to-live for cached entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default window during which a stale value is served after a failed refresh
pub const DEFAULT_STALE_RETRY_AFTER: Duration = Duration::from_secs(30);

/// What a cache does with an expired value when refreshing it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleFallback {
    /// Every read of an expired entry refetches and re-raises on failure
    #[default]
    Disabled,
    /// After a failed refresh, reads serve the stale value without I/O until
    /// `retry_after` elapses or the key is invalidated
    Enabled { retry_after: Duration },
}

impl StaleFallback {
    pub fn enabled(retry_after: Duration) -> Self {
        Self::Enabled { retry_after }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    /// How long the stale value is served after a failed refresh
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Enabled { retry_after } => Some(*retry_after),
            Self::Disabled => None,
        }
    }
}

/// Policy shared by every cache built from the same registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Time-to-live for newly populated entries
    pub ttl: Duration,
    /// Behaviour when refreshing an expired entry fails
    pub stale_fallback: StaleFallback,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            stale_fallback: StaleFallback::Disabled,
        }
    }
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the stale-on-error fallback
    pub fn with_stale_fallback(mut self, fallback: StaleFallback) -> Self {
        self.stale_fallback = fallback;
        self
    }
}
