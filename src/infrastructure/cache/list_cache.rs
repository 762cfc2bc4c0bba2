//! Cache of whole collections keyed by query tag

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tracing::debug;

use crate::domain::cache::{
    Arranged, CacheError, CachePolicy, CacheRead, RemoteSource, SortDirection, SortOrder,
    Sortable, StaleFallback,
};

use super::keyed::KeyedCache;

type Field<S> = <<S as RemoteSource>::Item as Sortable>::Field;

/// Caches collections fetched through [`RemoteSource::fetch_all`]
///
/// Each query tag (e.g. `"upcoming"`, `"opportunity"`, `"by-event/evt-1"`) is one
/// entry with the same TTL, invalidation and coalescing rules as
/// [`EntityCache`](super::EntityCache). Sorting happens client-side on the
/// cached sequences and never triggers a fetch. Each collection keeps its
/// arrival order, and every sort starts from it.
#[derive(Debug)]
pub struct ListCache<S>
where
    S: RemoteSource,
    S::Item: Sortable,
{
    source: Arc<S>,
    lists: KeyedCache<Arranged<S::Item>>,
    ordering: Mutex<Option<SortOrder<Field<S>>>>,
}

impl<S> ListCache<S>
where
    S: RemoteSource,
    S::Item: Sortable,
{
    pub fn new(name: impl Into<String>, source: Arc<S>, policy: CachePolicy) -> Self {
        Self {
            source,
            lists: KeyedCache::new(name, policy),
            ordering: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.lists.name()
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the collection for `query_tag`, fetching it when missing or stale.
    ///
    /// An empty collection is a valid cached value.
    pub async fn get_all(&self, query_tag: &str) -> Result<Vec<S::Item>, CacheError> {
        let source = Arc::clone(&self.source);
        let owned_tag = query_tag.to_string();

        self.lists
            .get_or_fetch(query_tag, move || {
                async move {
                    source
                        .fetch_all(&owned_tag)
                        .await
                        .map(Arranged::from)
                        .map_err(|e| CacheError::fetch(owned_tag.clone(), e))
                }
                .boxed()
            })
            .await
            .map(Arranged::into_vec)
    }

    /// Re-orders every cached collection in place and keeps the ordering for
    /// collections fetched later
    pub fn sort(&self, field: Field<S>, direction: SortDirection) {
        let order = SortOrder::new(field, direction);

        self.lists
            .set_prepare(Box::new(move |items: &mut Arranged<S::Item>| items.arrange(order)));
        *self.ordering.lock().unwrap_or_else(PoisonError::into_inner) = Some(order);

        debug!(cache = %self.name(), field = ?field, direction = %direction, "Sorted cached lists");
    }

    /// Active ordering, if [`sort`](Self::sort) was called
    pub fn ordering(&self) -> Option<SortOrder<Field<S>>> {
        *self.ordering.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a freshly created item to the cached collection for `query_tag`.
    ///
    /// The collection is marked stale either way, since the server may have
    /// computed fields the local copy does not know.
    pub fn append(&self, query_tag: &str, item: S::Item) -> bool {
        let appended = self.lists.amend(query_tag, move |items| items.push(item));
        debug!(cache = %self.name(), tag = %query_tag, appended, "Appended created item");
        appended
    }

    pub fn invalidate(&self, query_tag: &str) {
        self.lists.invalidate(query_tag);
    }

    pub fn invalidate_all(&self) {
        self.lists.invalidate_all();
    }

    /// Cached collection without fetching, valid or not
    pub fn peek(&self, query_tag: &str) -> Option<CacheRead<Vec<S::Item>>> {
        self.lists
            .peek(query_tag)
            .map(|read| read.map(Arranged::into_vec))
    }

    pub fn contains(&self, query_tag: &str) -> bool {
        self.lists.contains(query_tag)
    }

    pub fn is_pending(&self, query_tag: &str) -> bool {
        self.lists.is_pending(query_tag)
    }

    pub fn policy(&self) -> CachePolicy {
        self.lists.policy()
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.lists.set_ttl(ttl);
    }

    pub fn set_stale_fallback(&self, fallback: StaleFallback) {
        self.lists.set_stale_fallback(fallback);
    }
}
