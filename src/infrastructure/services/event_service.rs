//! Event service - cached events and participants

use std::sync::Arc;

use tracing::info;

use crate::domain::blob::DEFAULT_THUMBNAIL_FILENAME;
use crate::domain::cache::{CacheError, CachePolicy, SortDirection};
use crate::domain::document::{DocumentStore, Query};
use crate::domain::event::{
    CreateScheduledEvent, EVENT_MEMBERS_COLLECTION, EVENTS_COLLECTION, EventField,
    EventParticipant, NewScheduledEvent, ScheduledEvent, ScheduledEventPatch,
};
use crate::infrastructure::cache::{EntityCache, ListCache};
use crate::infrastructure::document::CollectionSource;

/// Query tag of the full event list
pub const ALL_EVENTS: &str = "all";

fn event_source(store: Arc<dyn DocumentStore>) -> CollectionSource<ScheduledEvent> {
    CollectionSource::new(store, EVENTS_COLLECTION)
        .with_query(
            ALL_EVENTS,
            Query::new().order_by("scheduleDateTime", SortDirection::Desc),
        )
}

fn participant_source(store: Arc<dyn DocumentStore>) -> CollectionSource<EventParticipant> {
    CollectionSource::new(store, EVENT_MEMBERS_COLLECTION)
        .with_scoped_query("by-event", |event_id| Query::new().where_eq("eventId", event_id))
}

#[derive(Debug)]
pub struct EventService {
    events: EntityCache<CollectionSource<ScheduledEvent>>,
    lists: ListCache<CollectionSource<ScheduledEvent>>,
    participants: ListCache<CollectionSource<EventParticipant>>,
}

impl EventService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: CachePolicy) -> Self {
        let source = Arc::new(event_source(store.clone()));

        Self {
            events: EntityCache::new("events", source.clone(), policy),
            lists: ListCache::new("event_lists", source, policy),
            participants: ListCache::new(
                "event_participants",
                Arc::new(participant_source(store)),
                policy,
            ),
        }
    }

    /// All events, latest schedule first unless re-sorted
    pub async fn list_events(&self) -> Result<Vec<ScheduledEvent>, CacheError> {
        self.lists.get_all(ALL_EVENTS).await
    }

    pub async fn get_event(&self, id: &str) -> Result<ScheduledEvent, CacheError> {
        self.events.get(id).await
    }

    /// Creates an event with an empty description and the default thumbnail
    pub async fn create_event(
        &self,
        details: CreateScheduledEvent,
    ) -> Result<ScheduledEvent, CacheError> {
        info!(title = %details.title, "Creating event");

        let created = self
            .events
            .create(NewScheduledEvent {
                details,
                description: String::new(),
                thumbnail_file_name: DEFAULT_THUMBNAIL_FILENAME.to_string(),
                whatsapp_link: None,
            })
            .await?;

        self.lists.append(ALL_EVENTS, created.clone());
        Ok(created)
    }

    pub async fn update_event(
        &self,
        id: &str,
        patch: ScheduledEventPatch,
    ) -> Result<(), CacheError> {
        self.events.write_through(id, patch).await?;
        self.lists.invalidate_all();
        Ok(())
    }

    pub fn sort_events(&self, field: EventField, direction: SortDirection) {
        self.lists.sort(field, direction);
    }

    pub async fn participants(&self, event_id: &str) -> Result<Vec<EventParticipant>, CacheError> {
        self.participants
            .get_all(&format!("by-event/{}", event_id))
            .await
    }

    /// Marks every cached event stale and reloads the list
    pub async fn revalidate_events(&self) -> Result<Vec<ScheduledEvent>, CacheError> {
        self.events.invalidate_all();
        self.lists.invalidate_all();
        self.list_events().await
    }

    pub fn events(&self) -> &EntityCache<CollectionSource<ScheduledEvent>> {
        &self.events
    }

    pub fn lists(&self) -> &ListCache<CollectionSource<ScheduledEvent>> {
        &self.lists
    }
}
