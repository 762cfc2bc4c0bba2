//! Asset service - thumbnails of events and trainings

use std::sync::Arc;

use tracing::{info, warn};

use super::{EventService, TrainingService};
use crate::domain::DomainError;
use crate::domain::blob::{BlobUpload, StoredBlob};
use crate::domain::cache::CacheError;
use crate::domain::event::ScheduledEventPatch;
use crate::domain::training::TrainingPatch;
use crate::infrastructure::blob::CachedBlobResolver;

#[derive(Debug)]
pub struct AssetService {
    blobs: Arc<CachedBlobResolver>,
    events: Arc<EventService>,
    trainings: Arc<TrainingService>,
}

impl AssetService {
    pub fn new(
        blobs: Arc<CachedBlobResolver>,
        events: Arc<EventService>,
        trainings: Arc<TrainingService>,
    ) -> Self {
        Self {
            blobs,
            events,
            trainings,
        }
    }

    async fn upload(&self, owner: &str, upload: BlobUpload) -> Result<StoredBlob, CacheError> {
        self.blobs.upload(upload).await.map_err(|e| {
            warn!(owner = %owner, error = %e, "Thumbnail upload failed");
            CacheError::write(owner, e)
        })
    }

    /// Uploads a new thumbnail and points the event at it
    pub async fn replace_event_thumbnail(
        &self,
        event_id: &str,
        upload: BlobUpload,
    ) -> Result<StoredBlob, CacheError> {
        let stored = self.upload(event_id, upload).await?;
        self.events
            .update_event(event_id, ScheduledEventPatch::thumbnail(&stored.filename))
            .await?;

        info!(id = %event_id, filename = %stored.filename, "Replaced event thumbnail");
        Ok(stored)
    }

    /// Uploads a new thumbnail and points the training at it
    pub async fn replace_training_thumbnail(
        &self,
        training_id: &str,
        upload: BlobUpload,
    ) -> Result<StoredBlob, CacheError> {
        let stored = self.upload(training_id, upload).await?;
        self.trainings
            .update_training(training_id, TrainingPatch::thumbnail(&stored.filename))
            .await?;

        info!(id = %training_id, filename = %stored.filename, "Replaced training thumbnail");
        Ok(stored)
    }

    pub async fn thumbnail_url(&self, filename: &str) -> Result<String, DomainError> {
        self.blobs.resolve(filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::blob::MockBlobStore;
    use crate::domain::cache::CachePolicy;
    use crate::infrastructure::document::InMemoryDocumentStore;
    use std::time::Duration;

    const FIXTURE: &str = r#"{
        "collections": {
            "events": [
                {"id": "e1", "title": "Kickoff", "scheduleDateTime": "2024-03-01T09:00:00Z",
                 "scheduleEndDateTime": "2024-03-01T10:00:00Z", "venue": "Hall", "organizer": "Seetrum",
                 "thumbnailFileName": "default-thumbnail.png"}
            ],
            "trainings": [
                {"id": "t1", "tag": "training", "title": "Solar 101", "dueDate": "2024-04-01T00:00:00Z",
                 "thumbnailFileName": "default-thumbnail.png"}
            ]
        }
    }"#;

    fn service(blobs: MockBlobStore) -> (Arc<EventService>, Arc<TrainingService>, AssetService) {
        let store = Arc::new(InMemoryDocumentStore::from_fixture_str(FIXTURE).unwrap());
        let events = Arc::new(EventService::new(store.clone(), CachePolicy::default()));
        let trainings = Arc::new(TrainingService::new(store, CachePolicy::default()));
        let resolver = Arc::new(CachedBlobResolver::new(
            Arc::new(blobs),
            Duration::from_secs(60),
        ));

        let assets = AssetService::new(resolver, events.clone(), trainings.clone());
        (events, trainings, assets)
    }

    fn uploading(filename: &'static str) -> MockBlobStore {
        let mut blobs = MockBlobStore::new();
        blobs.expect_upload().times(1).returning(move |upload| {
            assert_eq!(upload.name, "poster.png");
            Ok(StoredBlob {
                filename: filename.to_string(),
                content_type: "image/png".to_string(),
            })
        });
        blobs
    }

    #[tokio::test]
    async fn test_replace_event_thumbnail_invalidates_event() {
        let (events, _, assets) = service(uploading("1700-poster.png"));
        events.get_event("e1").await.unwrap();

        let stored = assets
            .replace_event_thumbnail("e1", BlobUpload::new("poster.png", vec![1]))
            .await
            .unwrap();

        assert_eq!(stored.filename, "1700-poster.png");
        assert!(events.events().peek("e1").unwrap().stale);
        assert_eq!(
            events.get_event("e1").await.unwrap().thumbnail_file_name,
            "1700-poster.png"
        );
    }

    #[tokio::test]
    async fn test_replace_training_thumbnail() {
        let (_, trainings, assets) = service(uploading("1800-poster.png"));

        assets
            .replace_training_thumbnail("t1", BlobUpload::new("poster.png", vec![1]))
            .await
            .unwrap();

        assert_eq!(
            trainings.get_training("t1").await.unwrap().thumbnail_file_name,
            "1800-poster.png"
        );
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_entity_untouched() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_upload()
            .returning(|_| Err(DomainError::blob("bucket unavailable")));
        let (events, _, assets) = service(blobs);
        events.get_event("e1").await.unwrap();

        let err = assets
            .replace_event_thumbnail("e1", BlobUpload::new("poster.png", vec![1]))
            .await
            .unwrap_err();

        assert!(err.is_write());
        assert_eq!(err.key(), "e1");
        assert!(!events.events().peek("e1").unwrap().stale);
    }

    #[tokio::test]
    async fn test_thumbnail_for_missing_event_fails_after_upload() {
        let (_, _, assets) = service(uploading("1900-poster.png"));

        let err = assets
            .replace_event_thumbnail("e9", BlobUpload::new("poster.png", vec![1]))
            .await
            .unwrap_err();

        assert!(err.is_write());
    }

    #[tokio::test]
    async fn test_thumbnail_url_resolves_through_cache() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_resolve()
            .times(1)
            .returning(|name| Ok(format!("https://cdn.example.com/{}", name)));
        let (_, _, assets) = service(blobs);

        let url = assets.thumbnail_url("1700-poster.png").await.unwrap();
        tokio_test::assert_ok!(assets.thumbnail_url("1700-poster.png").await);

        assert_eq!(url, "https://cdn.example.com/1700-poster.png");
    }
}
