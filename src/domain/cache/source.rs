//! Remote source contract the caches read through

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Asynchronous access to the records behind a cache
///
/// `fetch_one` returns `Ok(None)` when the record does not exist.
/// Query tags name whole collections, e.g. `"all"` or `"by-event/evt-1"`.
#[async_trait]
pub trait RemoteSource: Send + Sync + Debug + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Patch: Send + 'static;
    type Payload: Send + 'static;

    async fn fetch_one(&self, key: &str) -> Result<Option<Self::Item>, DomainError>;

    async fn fetch_all(&self, query_tag: &str) -> Result<Vec<Self::Item>, DomainError>;

    async fn update(&self, key: &str, patch: Self::Patch) -> Result<(), DomainError>;

    /// Creates a record; the server assigns its id and creation timestamp
    async fn create(&self, payload: Self::Payload) -> Result<Self::Item, DomainError>;
}
