//! In-memory document store

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::document::{Document, DocumentStore, Query};

type Collections = HashMap<String, BTreeMap<String, Document>>;

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    collections: HashMap<String, Vec<Map<String, Value>>>,
}

/// Thread-safe in-memory document store
///
/// Useful for tests, demos and the CLI. Can be switched offline so every
/// call fails with a transport error.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
    offline: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `{"collections": {"<name>": [{"id": ..., ...}]}}` fixture
    pub fn from_fixture_str(json: &str) -> Result<Self, DomainError> {
        let fixture: Fixture = serde_json::from_str(json)
            .map_err(|e| DomainError::configuration(format!("Invalid fixture: {}", e)))?;

        let store = Self::new();
        {
            let mut collections = store.collections.write().map_err(|e| {
                DomainError::storage(format!("Failed to acquire write lock: {}", e))
            })?;

            for (name, records) in fixture.collections {
                let documents = collections.entry(name.clone()).or_default();
                for record in records {
                    let document = document_from_fixture(&name, record)?;
                    documents.insert(document.id.clone(), document);
                }
            }
        }

        info!(collections = store.collection_count(), "Loaded document fixture");
        Ok(store)
    }

    pub fn from_fixture_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read fixture '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_fixture_str(&json)
    }

    /// Inserts or replaces a document
    pub fn insert(&self, collection: &str, document: Document) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id.clone(), document);
        Ok(())
    }

    /// Makes every subsequent call fail with a transport error, or restores service
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        debug!(offline, "Document store connectivity changed");
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn collection_count(&self) -> usize {
        self.collections.read().map(|c| c.len()).unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<(), DomainError> {
        if self.is_offline() {
            return Err(DomainError::transport("Document store is unreachable"));
        }
        Ok(())
    }
}

fn timestamp_field(
    record: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, DomainError> {
    match record.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| DomainError::configuration(format!("Invalid {} '{}': {}", field, s, e))),
        Some(other) => Err(DomainError::configuration(format!(
            "Invalid {}: {}",
            field, other
        ))),
    }
}

fn document_from_fixture(
    collection: &str,
    mut record: Map<String, Value>,
) -> Result<Document, DomainError> {
    let id = match record.remove("id") {
        Some(Value::String(id)) => id,
        None => Uuid::new_v4().to_string(),
        Some(other) => {
            return Err(DomainError::configuration(format!(
                "Invalid id in '{}': {}",
                collection, other
            )));
        }
    };
    let created_at = timestamp_field(&mut record, "createdAt")?.unwrap_or_else(Utc::now);
    let updated_at = timestamp_field(&mut record, "updatedAt")?;

    let mut document = Document::new(id, created_at, record);
    document.updated_at = updated_at;
    Ok(document)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError> {
        self.ensure_online()?;
        let collections = self.collections.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, DomainError> {
        self.ensure_online()?;
        let collections = self.collections.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let documents = collections
            .get(collection)
            .map(|documents| documents.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        Ok(query.apply(documents))
    }

    async fn add(
        &self,
        collection: &str,
        data: Map<String, Value>,
    ) -> Result<Document, DomainError> {
        self.ensure_online()?;
        let document = Document::new(Uuid::new_v4().to_string(), Utc::now(), data);
        self.insert(collection, document.clone())?;

        debug!(collection = %collection, id = %document.id, "Added document");
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<(), DomainError> {
        self.ensure_online()?;
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| {
                DomainError::not_found(format!("Document '{}/{}' not found", collection, id))
            })?;

        document.merge(patch, Utc::now());
        debug!(collection = %collection, id = %id, "Updated document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::SortDirection;
    use serde_json::json;

    const FIXTURE: &str = r#"{
        "collections": {
            "trainings": [
                {"id": "t1", "createdAt": "2024-01-01T00:00:00Z", "tag": "training", "title": "Solar 101"},
                {"id": "t2", "createdAt": "2024-01-02T00:00:00Z", "tag": "opportunity", "title": "Field engineer"},
                {"id": "t3", "createdAt": "2024-01-03T00:00:00Z", "tag": "training", "title": "Wind basics"}
            ]
        }
    }"#;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    #[tokio::test]
    async fn test_fixture_and_query() {
        let store = InMemoryDocumentStore::from_fixture_str(FIXTURE).unwrap();

        let trainings = store
            .query(
                "trainings",
                &Query::new()
                    .where_eq("tag", "training")
                    .order_by("createdAt", SortDirection::Desc),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = trainings.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t1"]);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = InMemoryDocumentStore::new();

        assert!(store.query("events", &Query::new()).await.unwrap().is_empty());
        assert!(store.get("events", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_timestamp() {
        let store = InMemoryDocumentStore::new();
        let before = Utc::now();

        let added = store
            .add("events", fields(json!({"title": "Kickoff"})))
            .await
            .unwrap();

        assert!(Uuid::parse_str(&added.id).is_ok());
        assert!(added.created_at >= before);
        let stored = store.get("events", &added.id).await.unwrap().unwrap();
        assert_eq!(stored, added);
    }

    #[tokio::test]
    async fn test_update_merges_and_stamps() {
        let store = InMemoryDocumentStore::from_fixture_str(FIXTURE).unwrap();

        store
            .update("trainings", "t1", fields(json!({"title": "Solar 102"})))
            .await
            .unwrap();

        let updated = store.get("trainings", "t1").await.unwrap().unwrap();
        assert_eq!(updated.data["title"], "Solar 102");
        assert_eq!(updated.data["tag"], "training");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();

        let err = store
            .update("trainings", "nope", Map::new())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_offline_store_fails_with_transport() {
        let store = InMemoryDocumentStore::from_fixture_str(FIXTURE).unwrap();
        store.set_offline(true);

        let err = store.get("trainings", "t1").await.unwrap_err();
        assert!(matches!(err, DomainError::Transport { .. }));

        store.set_offline(false);
        assert!(store.get("trainings", "t1").await.unwrap().is_some());
    }

    #[test]
    fn test_invalid_fixture_is_configuration_error() {
        let err = InMemoryDocumentStore::from_fixture_str("{not json").unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }
}
