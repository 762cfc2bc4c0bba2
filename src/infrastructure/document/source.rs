//! Remote source backed by one document collection

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::cache::RemoteSource;
use crate::domain::document::{DocumentStore, Entity, Query, to_fields};

/// Builds the query of a scoped tag from its argument
pub type ScopedQuery = fn(&str) -> Query;

#[derive(Clone)]
enum QueryTemplate {
    Fixed(Query),
    Scoped(ScopedQuery),
}

impl fmt::Debug for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(query) => f.debug_tuple("Fixed").field(query).finish(),
            Self::Scoped(_) => f.write_str("Scoped"),
        }
    }
}

/// Reads and writes entities of type `E` in a document collection
///
/// Query tags are registered up front: fixed tags (`"all"`) map to one
/// query, scoped tags (`"by-event"`) are used as `"by-event/<argument>"`.
pub struct CollectionSource<E: Entity> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    queries: HashMap<String, QueryTemplate>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CollectionSource<E> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            queries: HashMap::new(),
            _entity: PhantomData,
        }
    }

    pub fn with_query(mut self, tag: impl Into<String>, query: Query) -> Self {
        self.queries.insert(tag.into(), QueryTemplate::Fixed(query));
        self
    }

    pub fn with_scoped_query(mut self, name: impl Into<String>, build: ScopedQuery) -> Self {
        self.queries.insert(name.into(), QueryTemplate::Scoped(build));
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Resolves a query tag to its document query
    pub fn resolve(&self, query_tag: &str) -> Result<Query, DomainError> {
        let template = match query_tag.split_once('/') {
            Some((name, argument)) if !argument.is_empty() => match self.queries.get(name) {
                Some(QueryTemplate::Scoped(build)) => return Ok(build(argument)),
                _ => None,
            },
            Some(_) => None,
            None => self.queries.get(query_tag),
        };

        match template {
            Some(QueryTemplate::Fixed(query)) => Ok(query.clone()),
            _ => Err(DomainError::validation(format!(
                "Unknown query tag '{}' for collection '{}'",
                query_tag, self.collection
            ))),
        }
    }
}

impl<E: Entity> fmt::Debug for CollectionSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSource")
            .field("collection", &self.collection)
            .field("queries", &self.queries)
            .finish()
    }
}

#[async_trait]
impl<E: Entity> RemoteSource for CollectionSource<E> {
    type Item = E;
    type Patch = E::Patch;
    type Payload = E::Payload;

    async fn fetch_one(&self, key: &str) -> Result<Option<E>, DomainError> {
        match self.store.get(&self.collection, key).await? {
            Some(document) => document.into_entity().map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_all(&self, query_tag: &str) -> Result<Vec<E>, DomainError> {
        let query = self.resolve(query_tag)?;
        let documents = self.store.query(&self.collection, &query).await?;

        debug!(
            collection = %self.collection,
            tag = %query_tag,
            count = documents.len(),
            "Queried collection"
        );

        documents.into_iter().map(|d| d.into_entity()).collect()
    }

    async fn update(&self, key: &str, patch: E::Patch) -> Result<(), DomainError> {
        let fields = to_fields(&patch)?;
        self.store.update(&self.collection, key, fields).await
    }

    async fn create(&self, payload: E::Payload) -> Result<E, DomainError> {
        let fields = to_fields(&payload)?;
        self.store.add(&self.collection, fields).await?.into_entity()
    }
}
