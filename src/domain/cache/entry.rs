//! Cached values and their staleness metadata

use std::time::Duration;

use tokio::time::Instant;

/// One cached value plus the metadata deciding whether it can be served
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
    ttl: Duration,
    invalidated: bool,
}

impl<T> CacheEntry<T> {
    /// Creates a freshly fetched entry
    pub fn new(value: T, fetched_at: Instant, ttl: Duration) -> Self {
        Self {
            value,
            fetched_at,
            ttl,
            invalidated: false,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Instant after which the entry is no longer served without a fetch.
    ///
    /// `None` when the TTL reaches past the clock's range, i.e. never.
    pub fn expires_at(&self) -> Option<Instant> {
        if self.invalidated {
            Some(self.fetched_at)
        } else {
            self.fetched_at.checked_add(self.ttl)
        }
    }

    /// An entry is valid while `now < fetched_at + ttl` and it was not invalidated
    pub fn is_valid(&self, now: Instant) -> bool {
        !self.invalidated && self.expires_at().is_none_or(|expires_at| now < expires_at)
    }

    /// Expires the entry immediately, keeping the value for stale reads
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Replaces the value after a successful refetch
    pub fn refresh(&mut self, value: T, fetched_at: Instant, ttl: Duration) {
        self.value = value;
        self.fetched_at = fetched_at;
        self.ttl = ttl;
        self.invalidated = false;
    }
}

/// Result of a non-fetching read, carrying staleness metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    /// The cached value
    pub value: T,
    /// Age of the value at the time of the read
    pub age: Duration,
    /// Whether the value would have triggered a fetch on `get`
    pub stale: bool,
}

impl<T> CacheRead<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn is_fresh(&self) -> bool {
        !self.stale
    }

    /// Converts the value, keeping age and staleness
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheRead<U> {
        CacheRead {
            value: f(self.value),
            age: self.age,
            stale: self.stale,
        }
    }
}
