//! Errors surfaced by the entity caches

use std::sync::Arc;

use thiserror::Error;

use crate::domain::DomainError;

/// Error returned by cache reads and writes
///
/// Cloneable so that every caller joined on a coalesced fetch receives the
/// same error.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The source has no record for the key. Never cached.
    #[error("No record found for '{key}'")]
    NotFound { key: String },

    /// Transport or server error while fetching. Any stale value is kept.
    #[error("Failed to fetch '{key}': {source}")]
    Fetch {
        key: String,
        #[source]
        source: Arc<DomainError>,
    },

    /// Update or create failed. Cached state is left untouched.
    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: Arc<DomainError>,
    },
}

impl CacheError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn fetch(key: impl Into<String>, source: DomainError) -> Self {
        Self::Fetch {
            key: key.into(),
            source: Arc::new(source),
        }
    }

    pub fn write(key: impl Into<String>, source: DomainError) -> Self {
        Self::Write {
            key: key.into(),
            source: Arc::new(source),
        }
    }

    /// Key (or query tag) the failed operation was addressing
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound { key } | Self::Fetch { key, .. } | Self::Write { key, .. } => key,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

impl PartialEq for CacheError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound { key: a }, Self::NotFound { key: b }) => a == b,
            (Self::Fetch { key: a, source: x }, Self::Fetch { key: b, source: y })
            | (Self::Write { key: a, source: x }, Self::Write { key: b, source: y }) => {
                a == b && (Arc::ptr_eq(x, y) || x.to_string() == y.to_string())
            }
            _ => false,
        }
    }
}
