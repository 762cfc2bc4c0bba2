//! Read-through cache for single records

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{info, warn};

use crate::domain::cache::{CacheError, CachePolicy, CacheRead, RemoteSource, StaleFallback};

use super::keyed::KeyedCache;

/// Keyed cache of single records read through a [`RemoteSource`]
///
/// - valid entries are served without I/O
/// - concurrent reads of the same key share one fetch
/// - failed fetches leave the last known value in place
/// - writes go to the source and invalidate the key instead of merging locally
#[derive(Debug)]
pub struct EntityCache<S: RemoteSource> {
    source: Arc<S>,
    entries: KeyedCache<S::Item>,
}

impl<S: RemoteSource> EntityCache<S> {
    pub fn new(name: impl Into<String>, source: Arc<S>, policy: CachePolicy) -> Self {
        Self {
            source,
            entries: KeyedCache::new(name, policy),
        }
    }

    pub fn name(&self) -> &str {
        self.entries.name()
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the record for `key`, fetching it when missing or stale
    pub async fn get(&self, key: &str) -> Result<S::Item, CacheError> {
        let source = Arc::clone(&self.source);
        let owned_key = key.to_string();

        self.entries
            .get_or_fetch(key, move || {
                async move {
                    match source.fetch_one(&owned_key).await {
                        Ok(Some(item)) => Ok(item),
                        Ok(None) => Err(CacheError::not_found(owned_key)),
                        Err(e) if e.is_not_found() => Err(CacheError::not_found(owned_key)),
                        Err(e) => Err(CacheError::fetch(owned_key, e)),
                    }
                }
                .boxed()
            })
            .await
    }

    /// Marks `key` stale; the value stays available through [`peek`](Self::peek)
    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Sends `patch` to the source and, once it is accepted, invalidates `key`
    pub async fn write_through(&self, key: &str, patch: S::Patch) -> Result<(), CacheError> {
        match self.source.update(key, patch).await {
            Ok(()) => {
                self.entries.invalidate(key);
                info!(cache = %self.name(), key = %key, "Write accepted, entry invalidated");
                Ok(())
            }
            Err(e) => {
                warn!(cache = %self.name(), key = %key, error = %e, "Write rejected");
                Err(CacheError::write(key, e))
            }
        }
    }

    /// Creates a record at the source. The cache is not primed with the result.
    pub async fn create(&self, payload: S::Payload) -> Result<S::Item, CacheError> {
        self.source.create(payload).await.map_err(|e| {
            warn!(cache = %self.name(), error = %e, "Create rejected");
            CacheError::write(format!("{}/new", self.name()), e)
        })
    }

    /// Cached value for `key` without fetching, valid or not
    pub fn peek(&self, key: &str) -> Option<CacheRead<S::Item>> {
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.entries.is_pending(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> CachePolicy {
        self.entries.policy()
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.entries.set_ttl(ttl);
    }

    pub fn set_stale_fallback(&self, fallback: StaleFallback) {
        self.entries.set_stale_fallback(fallback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::domain::cache::mock::{MockSource, Record, RecordPatch};

    fn cache_with(source: MockSource, policy: CachePolicy) -> (Arc<MockSource>, EntityCache<MockSource>) {
        let source = Arc::new(source);
        let cache = EntityCache::new("records", Arc::clone(&source), policy);
        (source, cache)
    }

    fn ttl_300() -> CachePolicy {
        CachePolicy::default().with_ttl(Duration::from_secs(300))
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_fetched_key_triggers_one_fetch() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        let record = cache.get("a").await.unwrap();

        assert_eq!(record.title, "Alpha");
        assert_eq!(source.fetch_one_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_entry_served_without_fetch() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        cache.get("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(100)).await;
        let record = cache.get("a").await.unwrap();

        assert_eq!(record.title, "Alpha");
        assert_eq!(source.fetch_one_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetches() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        cache.get("a").await.unwrap();
        source.set_record(Record::new("a", "Alpha v2", 1));
        tokio::time::advance(Duration::from_secs(301)).await;

        let record = cache.get("a").await.unwrap();
        assert_eq!(record.title, "Alpha v2");
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_coalesce() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        let (r1, r2, r3, r4) = tokio::join!(cache.get("a"), cache.get("a"), cache.get("a"), cache.get("a"));

        assert_eq!(source.fetch_one_calls(), 1);
        let first = r1.unwrap();
        assert_eq!(r2.unwrap(), first);
        assert_eq!(r3.unwrap(), first);
        assert_eq!(r4.unwrap(), first);
        assert!(!cache.is_pending("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_failures_share_one_error() {
        let source = MockSource::new();
        source.fail_fetches(DomainError::transport("connection reset"));
        let (source, cache) = cache_with(source, ttl_300());

        let (r1, r2, r3) = tokio::join!(cache.get("a"), cache.get("a"), cache.get("a"));

        assert_eq!(source.fetch_one_calls(), 1);
        let error = r1.unwrap_err();
        assert!(error.is_fetch());
        assert_eq!(r2.unwrap_err(), error);
        assert_eq!(r3.unwrap_err(), error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_keys_fetch_independently() {
        let (source, cache) = cache_with(
            MockSource::new()
                .with_record(Record::new("a", "Alpha", 1))
                .with_record(Record::new("b", "Beta", 2)),
            ttl_300(),
        );

        let (a, b) = tokio::join!(cache.get("a"), cache.get("b"));

        assert_eq!(a.unwrap().title, "Alpha");
        assert_eq!(b.unwrap().title, "Beta");
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_fetch_before_ttl() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        cache.get("a").await.unwrap();
        cache.invalidate("a");

        let read = cache.peek("a").unwrap();
        assert!(read.stale);
        assert_eq!(read.value.title, "Alpha");

        cache.get("a").await.unwrap();
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_through_then_get_reads_post_write_state() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        let before = cache.get("a").await.unwrap();
        cache
            .write_through("a", RecordPatch { title: "Renamed".to_string() })
            .await
            .unwrap();
        let after = cache.get("a").await.unwrap();

        assert_eq!(before.revision, 1);
        assert_eq!(after.title, "Renamed");
        assert_eq!(after.revision, 2);
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_does_not_invalidate() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        cache.get("a").await.unwrap();
        source.fail_writes(DomainError::conflict("revision mismatch"));

        let error = cache
            .write_through("a", RecordPatch { title: "Renamed".to_string() })
            .await
            .unwrap_err();

        assert!(error.is_write());
        assert_eq!(error.key(), "a");
        assert!(!cache.peek("a").unwrap().stale);

        cache.get("a").await.unwrap();
        assert_eq!(source.fetch_one_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_cached() {
        let (source, cache) = cache_with(MockSource::new(), ttl_300());

        let error = cache.get("ghost").await.unwrap_err();
        assert!(error.is_not_found());
        assert!(!cache.contains("ghost"));

        source.set_record(Record::new("ghost", "Appeared", 1));
        let record = cache.get("ghost").await.unwrap();

        assert_eq!(record.title, "Appeared");
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_first_fetch_leaves_no_entry() {
        let source = MockSource::new().with_record(Record::new("user-42", "Ada", 1));
        source.fail_fetches(DomainError::transport("offline"));
        let (_, cache) = cache_with(source, ttl_300());

        let error = cache.get("user-42").await.unwrap_err();

        assert!(error.is_fetch());
        assert_eq!(error.key(), "user-42");
        assert!(!cache.contains("user-42"));
        assert!(cache.peek("user-42").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_on_error_disabled_reraises() {
        let (source, cache) = cache_with(
            MockSource::new().with_record(Record::new("user-42", "Ada", 1)),
            ttl_300(),
        );

        let v1 = cache.get("user-42").await.unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        source.fail_fetches(DomainError::transport("offline"));

        assert!(cache.get("user-42").await.unwrap_err().is_fetch());
        assert!(cache.get("user-42").await.unwrap_err().is_fetch());
        assert_eq!(source.fetch_one_calls(), 3);

        let read = cache.peek("user-42").unwrap();
        assert!(read.stale);
        assert_eq!(read.value, v1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_on_error_enabled_serves_last_known_value() {
        let policy = ttl_300().with_stale_fallback(StaleFallback::enabled(Duration::from_secs(30)));
        let (source, cache) = cache_with(
            MockSource::new().with_record(Record::new("user-42", "Ada", 1)),
            policy,
        );

        let v1 = cache.get("user-42").await.unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        source.fail_fetches(DomainError::transport("offline"));

        assert!(cache.get("user-42").await.unwrap_err().is_fetch());
        assert_eq!(cache.get("user-42").await.unwrap(), v1);
        assert_eq!(source.fetch_one_calls(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.get("user-42").await.unwrap_err().is_fetch());
        assert_eq!(source.fetch_one_calls(), 3);

        source.heal();
        source.set_record(Record::new("user-42", "Ada Lovelace", 1));
        cache.invalidate("user-42");
        assert_eq!(cache.get("user-42").await.unwrap().title, "Ada Lovelace");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_serves_from_cache() {
        let policy = CachePolicy::default().with_ttl(Duration::from_secs(u64::MAX));
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), policy);

        cache.get("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(10 * 365 * 24 * 3600)).await;
        let record = cache.get("a").await.unwrap();

        assert_eq!(record.title, "Alpha");
        assert_eq!(source.fetch_one_calls(), 1);
        assert!(!cache.peek("a").unwrap().stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_stale_window_keeps_serving() {
        let policy = ttl_300().with_stale_fallback(StaleFallback::enabled(Duration::MAX));
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), policy);

        let v1 = cache.get("a").await.unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        source.fail_fetches(DomainError::transport("offline"));

        assert!(cache.get("a").await.unwrap_err().is_fetch());
        tokio::time::advance(Duration::from_secs(10 * 365 * 24 * 3600)).await;
        assert_eq!(cache.get("a").await.unwrap(), v1);
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_caller_still_populates() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        {
            let pending = cache.get("a");
            tokio::pin!(pending);
            assert!(futures::poll!(&mut pending).is_pending());
        }
        assert!(cache.is_pending("a"));

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(cache.contains("a"));
        assert!(!cache.is_pending("a"));
        cache.get("a").await.unwrap();
        assert_eq!(source.fetch_one_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_fetch_discards_result() {
        let (source, cache) =
            cache_with(MockSource::new().with_record(Record::new("a", "Alpha", 1)), ttl_300());

        let early = cache.get("a");
        tokio::pin!(early);
        assert!(futures::poll!(&mut early).is_pending());

        cache.invalidate("a");
        assert!(!cache.is_pending("a"));

        assert_eq!(early.await.unwrap().title, "Alpha");
        assert!(!cache.contains("a"));

        cache.get("a").await.unwrap();
        assert_eq!(source.fetch_one_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_reports_write_error() {
        let source = MockSource::new();
        source.fail_writes(DomainError::transport("offline"));
        let (_, cache) = cache_with(source, ttl_300());

        let error = cache.create(Record::new("", "New", 0)).await.unwrap_err();
        assert!(error.is_write());
        assert_eq!(error.key(), "records/new");
    }
}
