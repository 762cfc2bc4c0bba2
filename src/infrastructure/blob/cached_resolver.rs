use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::domain::DomainError;
use crate::domain::blob::{BlobStore, BlobUpload, StoredBlob};

/// Blob store front that caches resolved download URLs with a TTL
pub struct CachedBlobResolver {
    inner: Arc<dyn BlobStore>,
    urls: Cache<String, String>,
}

impl CachedBlobResolver {
    pub fn new(inner: Arc<dyn BlobStore>, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, 1_000)
    }

    pub fn with_capacity(inner: Arc<dyn BlobStore>, ttl: Duration, capacity: u64) -> Self {
        let urls = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { inner, urls }
    }

    pub async fn upload(&self, upload: BlobUpload) -> Result<StoredBlob, DomainError> {
        self.inner.upload(upload).await
    }

    /// Download URL of `filename`; failures are not cached
    pub async fn resolve(&self, filename: &str) -> Result<String, DomainError> {
        if let Some(url) = self.urls.get(filename).await {
            tracing::debug!(filename = %filename, "Cache hit for blob URL");
            return Ok(url);
        }

        tracing::debug!(filename = %filename, "Cache miss, resolving blob URL");
        let url = self.inner.resolve(filename).await?;
        self.urls.insert(filename.to_string(), url.clone()).await;

        Ok(url)
    }

    pub async fn invalidate(&self, filename: &str) {
        self.urls.invalidate(filename).await;
    }

    pub fn invalidate_all(&self) {
        self.urls.invalidate_all();
    }
}

impl fmt::Debug for CachedBlobResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedBlobResolver")
            .field("cached_urls", &self.urls.entry_count())
            .finish()
    }
}
