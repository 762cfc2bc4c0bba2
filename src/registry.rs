//! Wiring of the per-entity services

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::blob::BlobStore;
use crate::domain::cache::CachePolicy;
use crate::domain::document::DocumentStore;
use crate::infrastructure::blob::{CachedBlobResolver, InMemoryBlobStore};
use crate::infrastructure::document::InMemoryDocumentStore;
use crate::infrastructure::services::{AssetService, EventService, MemberService, TrainingService};

const DEFAULT_BLOB_URL_TTL: Duration = Duration::from_secs(600);

/// One cached service per entity type, sharing a policy and collaborators
///
/// Built once and passed by reference; there is no global cache state.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    policy: CachePolicy,
    events: Arc<EventService>,
    trainings: Arc<TrainingService>,
    members: Arc<MemberService>,
    assets: Arc<AssetService>,
}

impl CacheRegistry {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        policy: CachePolicy,
    ) -> Self {
        Self::with_blob_url_ttl(documents, blobs, policy, DEFAULT_BLOB_URL_TTL)
    }

    pub fn with_blob_url_ttl(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        policy: CachePolicy,
        blob_url_ttl: Duration,
    ) -> Self {
        let events = Arc::new(EventService::new(documents.clone(), policy));
        let trainings = Arc::new(TrainingService::new(documents.clone(), policy));
        let members = Arc::new(MemberService::new(documents, policy));
        let resolver = Arc::new(CachedBlobResolver::new(blobs, blob_url_ttl));
        let assets = Arc::new(AssetService::new(
            resolver,
            events.clone(),
            trainings.clone(),
        ));

        info!(
            ttl_secs = policy.ttl.as_secs(),
            stale_on_error = policy.stale_fallback.is_enabled(),
            "Cache registry ready"
        );

        Self {
            policy,
            events,
            trainings,
            members,
            assets,
        }
    }

    /// Registry over in-memory collaborators, seeded from an optional fixture
    pub fn in_memory(
        config: &AppConfig,
        fixture: Option<&std::path::Path>,
    ) -> Result<Self, crate::domain::DomainError> {
        let documents = match fixture {
            Some(path) => InMemoryDocumentStore::from_fixture_file(path)?,
            None => InMemoryDocumentStore::new(),
        };
        let blobs = InMemoryBlobStore::new(config.blob.base_url.clone());

        Ok(Self::with_blob_url_ttl(
            Arc::new(documents),
            Arc::new(blobs),
            config.cache.policy(),
            config.blob.url_ttl(),
        ))
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn events(&self) -> &EventService {
        &self.events
    }

    pub fn trainings(&self) -> &TrainingService {
        &self.trainings
    }

    pub fn members(&self) -> &MemberService {
        &self.members
    }

    pub fn assets(&self) -> &AssetService {
        &self.assets
    }
}
