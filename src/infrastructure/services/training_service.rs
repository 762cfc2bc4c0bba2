//! Training service - trainings, opportunities and applicants

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::blob::DEFAULT_THUMBNAIL_FILENAME;
use crate::domain::cache::{CacheError, CachePolicy, SortDirection};
use crate::domain::document::{DocumentStore, Query};
use crate::domain::training::{
    Applicant, ApplicantPatch, ApplicantStatus, CreateTraining, NewTraining,
    TRAINING_MEMBERS_COLLECTION, TRAININGS_COLLECTION, Training, TrainingField, TrainingPatch,
    TrainingTag, default_file_requirements,
};
use crate::infrastructure::cache::{EntityCache, ListCache};
use crate::infrastructure::document::CollectionSource;

fn training_source(store: Arc<dyn DocumentStore>) -> CollectionSource<Training> {
    CollectionSource::new(store, TRAININGS_COLLECTION)
        .with_query(
            TrainingTag::Training.as_str(),
            Query::new().where_eq("tag", TrainingTag::Training.as_str()),
        )
        .with_query(
            TrainingTag::Opportunity.as_str(),
            Query::new().where_eq("tag", TrainingTag::Opportunity.as_str()),
        )
}

fn applicant_source(store: Arc<dyn DocumentStore>) -> CollectionSource<Applicant> {
    CollectionSource::new(store, TRAINING_MEMBERS_COLLECTION)
        .with_scoped_query("by-training", |training_id| {
            Query::new().where_eq("trainingId", training_id)
        })
        .with_scoped_query("member-opportunities", |member_id| {
            Query::new()
                .where_eq("memberId", member_id)
                .where_eq("tag", TrainingTag::Opportunity.as_str())
        })
}

#[derive(Debug)]
pub struct TrainingService {
    trainings: EntityCache<CollectionSource<Training>>,
    lists: ListCache<CollectionSource<Training>>,
    applicants: EntityCache<CollectionSource<Applicant>>,
    applicant_lists: ListCache<CollectionSource<Applicant>>,
}

impl TrainingService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: CachePolicy) -> Self {
        let trainings = Arc::new(training_source(store.clone()));
        let applicants = Arc::new(applicant_source(store));

        Self {
            trainings: EntityCache::new("trainings", trainings.clone(), policy),
            lists: ListCache::new("training_lists", trainings, policy),
            applicants: EntityCache::new("applicants", applicants.clone(), policy),
            applicant_lists: ListCache::new("applicant_lists", applicants, policy),
        }
    }

    /// Trainings or opportunities, depending on `tag`
    pub async fn list(&self, tag: TrainingTag) -> Result<Vec<Training>, CacheError> {
        self.lists.get_all(tag.as_str()).await
    }

    pub async fn get_training(&self, id: &str) -> Result<Training, CacheError> {
        self.trainings.get(id).await
    }

    /// Creates a training or opportunity.
    ///
    /// The due date is the deadline, or now when none is given. Templated
    /// trainings start with the default file requirements.
    pub async fn create_training(
        &self,
        payload: CreateTraining,
        tag: TrainingTag,
        with_template: bool,
    ) -> Result<Training, CacheError> {
        info!(title = %payload.title, tag = %tag, with_template, "Creating training");

        let created = self
            .trainings
            .create(NewTraining {
                tag,
                title: payload.title,
                due_date: payload.deadline.unwrap_or_else(Utc::now),
                description: String::new(),
                thumbnail_file_name: DEFAULT_THUMBNAIL_FILENAME.to_string(),
                attachments: Vec::new(),
                file_requirements: if with_template {
                    default_file_requirements()
                } else {
                    Vec::new()
                },
            })
            .await?;

        self.lists.append(tag.as_str(), created.clone());
        Ok(created)
    }

    pub async fn update_training(&self, id: &str, patch: TrainingPatch) -> Result<(), CacheError> {
        self.trainings.write_through(id, patch).await?;
        self.lists.invalidate_all();
        Ok(())
    }

    pub fn sort(&self, field: TrainingField, direction: SortDirection) {
        self.lists.sort(field, direction);
    }

    pub async fn applicants(&self, training_id: &str) -> Result<Vec<Applicant>, CacheError> {
        self.applicant_lists
            .get_all(&format!("by-training/{}", training_id))
            .await
    }

    /// Opportunities a member applied to, optionally only those in `status`
    pub async fn member_opportunities(
        &self,
        member_id: &str,
        status: Option<ApplicantStatus>,
    ) -> Result<Vec<Applicant>, CacheError> {
        let applications = self
            .applicant_lists
            .get_all(&format!("member-opportunities/{}", member_id))
            .await?;

        Ok(match status {
            Some(status) => applications
                .into_iter()
                .filter(|a| a.status == status)
                .collect(),
            None => applications,
        })
    }

    pub async fn get_applicant(&self, id: &str) -> Result<Applicant, CacheError> {
        self.applicants.get(id).await
    }

    pub async fn update_applicant_status(
        &self,
        applicant_id: &str,
        status: ApplicantStatus,
    ) -> Result<(), CacheError> {
        info!(id = %applicant_id, status = %status, "Updating applicant status");

        self.applicants
            .write_through(applicant_id, ApplicantPatch::status(status))
            .await?;
        self.applicant_lists.invalidate_all();
        Ok(())
    }

    pub fn revalidate(&self) {
        self.trainings.invalidate_all();
        self.lists.invalidate_all();
        self.applicants.invalidate_all();
        self.applicant_lists.invalidate_all();
    }

    pub fn trainings(&self) -> &EntityCache<CollectionSource<Training>> {
        &self.trainings
    }

    pub fn lists(&self) -> &ListCache<CollectionSource<Training>> {
        &self.lists
    }

    pub fn applicant_lists(&self) -> &ListCache<CollectionSource<Applicant>> {
        &self.applicant_lists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::document::InMemoryDocumentStore;
    use chrono::TimeZone;

    const FIXTURE: &str = r#"{
        "collections": {
            "trainings": [
                {"id": "t1", "tag": "training", "title": "Solar 101", "dueDate": "2024-04-01T00:00:00Z",
                 "thumbnailFileName": "default-thumbnail.png"},
                {"id": "t2", "tag": "opportunity", "title": "Field engineer", "dueDate": "2024-02-01T00:00:00Z",
                 "thumbnailFileName": "default-thumbnail.png"},
                {"id": "t3", "tag": "training", "title": "Battery storage", "dueDate": "2024-03-01T00:00:00Z",
                 "thumbnailFileName": "default-thumbnail.png"}
            ],
            "trainingMembers": [
                {"id": "a1", "trainingId": "t2", "memberId": "m1", "tag": "opportunity", "status": "applied",
                 "name": "Ada", "email": "ada@example.com"},
                {"id": "a2", "trainingId": "t1", "memberId": "m1", "tag": "training", "status": "accepted",
                 "name": "Ada", "email": "ada@example.com"},
                {"id": "a3", "trainingId": "t2", "memberId": "m2", "tag": "opportunity", "status": "rejected",
                 "name": "Grace", "email": "grace@example.com"}
            ]
        }
    }"#;

    fn service() -> (Arc<InMemoryDocumentStore>, TrainingService) {
        let store = Arc::new(InMemoryDocumentStore::from_fixture_str(FIXTURE).unwrap());
        let service = TrainingService::new(store.clone(), CachePolicy::default());
        (store, service)
    }

    #[tokio::test]
    async fn test_list_by_tag() {
        let (_, service) = service();

        let trainings = service.list(TrainingTag::Training).await.unwrap();
        let opportunities = service.list(TrainingTag::Opportunity).await.unwrap();

        assert_eq!(trainings.len(), 2);
        assert!(trainings.iter().all(|t| t.tag == TrainingTag::Training));
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].id, "t2");
    }

    #[tokio::test]
    async fn test_create_with_template_and_deadline() {
        let (_, service) = service();
        let deadline = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();

        let created = service
            .create_training(
                CreateTraining {
                    title: "Grid basics".to_string(),
                    deadline: Some(deadline),
                },
                TrainingTag::Training,
                true,
            )
            .await
            .unwrap();

        assert_eq!(created.due_date, deadline);
        assert_eq!(created.file_requirements, default_file_requirements());
        assert_eq!(created.thumbnail_file_name, DEFAULT_THUMBNAIL_FILENAME);
        assert_eq!(service.list(TrainingTag::Training).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_without_template_or_deadline() {
        let (_, service) = service();
        let before = Utc::now();

        let created = service
            .create_training(
                CreateTraining {
                    title: "Installer".to_string(),
                    deadline: None,
                },
                TrainingTag::Opportunity,
                false,
            )
            .await
            .unwrap();

        assert!(created.file_requirements.is_empty());
        assert!(created.due_date >= before);
        assert_eq!(created.tag, TrainingTag::Opportunity);
    }

    #[tokio::test]
    async fn test_create_touches_only_its_tag_list() {
        let (_, service) = service();
        service.list(TrainingTag::Training).await.unwrap();
        service.list(TrainingTag::Opportunity).await.unwrap();

        service
            .create_training(
                CreateTraining {
                    title: "Wind turbines".to_string(),
                    deadline: None,
                },
                TrainingTag::Training,
                false,
            )
            .await
            .unwrap();

        assert!(service.lists().peek(TrainingTag::Training.as_str()).unwrap().stale);
        assert!(!service.lists().peek(TrainingTag::Opportunity.as_str()).unwrap().stale);
        assert!(service.lists().get_all("all").await.unwrap_err().is_fetch());
    }

    #[tokio::test]
    async fn test_sort_by_due_date() {
        let (_, service) = service();
        service.list(TrainingTag::Training).await.unwrap();

        service.sort(TrainingField::DueDate, SortDirection::Asc);
        let ascending = service.list(TrainingTag::Training).await.unwrap();
        assert_eq!(ascending[0].id, "t3");

        service.sort(TrainingField::DueDate, SortDirection::Desc);
        let descending = service.list(TrainingTag::Training).await.unwrap();
        assert_eq!(descending[0].id, "t1");
    }

    #[tokio::test]
    async fn test_member_opportunities_with_status_filter() {
        let (_, service) = service();

        let all = service.member_opportunities("m1", None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a1");

        let accepted = service
            .member_opportunities("m1", Some(ApplicantStatus::Accepted))
            .await
            .unwrap();
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn test_update_applicant_status_refreshes_lists() {
        let (_, service) = service();
        let before = service.applicants("t2").await.unwrap();
        assert_eq!(before.len(), 2);

        service
            .update_applicant_status("a1", ApplicantStatus::Accepted)
            .await
            .unwrap();

        let after = service.applicants("t2").await.unwrap();
        let updated = after.iter().find(|a| a.id == "a1").unwrap();
        assert_eq!(updated.status, ApplicantStatus::Accepted);
        assert_eq!(updated.status.review_label(), "Accepted");
        assert_eq!(
            service.get_applicant("a1").await.unwrap().status,
            ApplicantStatus::Accepted
        );
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cache() {
        let (store, service) = service();
        service.get_training("t1").await.unwrap();
        store.set_offline(true);

        let err = service
            .update_training(
                "t1",
                TrainingPatch {
                    title: Some("Solar 201".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_write());
        let cached = service.trainings().peek("t1").unwrap();
        assert!(!cached.stale);
        assert_eq!(cached.value.title, "Solar 101");
    }
}
