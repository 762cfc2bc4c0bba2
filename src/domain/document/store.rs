//! Document store contract

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Document, Query};
use crate::domain::DomainError;

/// Collection-based document database
///
/// The store assigns document ids and the `createdAt` timestamp on `add`,
/// and stamps `updatedAt` on `update`.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Returns `Ok(None)` when the document does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, DomainError>;

    async fn add(&self, collection: &str, data: Map<String, Value>)
    -> Result<Document, DomainError>;

    /// Shallow-merges `patch`; fails with `NotFound` when the document is missing
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<(), DomainError>;
}
