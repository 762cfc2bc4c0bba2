//! Scheduled event entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::cache::{SortValue, Sortable};
use crate::domain::document::Entity;

/// Collection holding scheduled events
pub const EVENTS_COLLECTION: &str = "events";

/// An event on the community calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub title: String,
    pub schedule_date_time: DateTime<Utc>,
    pub schedule_end_date_time: DateTime<Utc>,
    pub venue: String,
    pub organizer: String,
    #[serde(default)]
    pub description: String,
    pub thumbnail_file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
}

/// Fields an organizer fills in when creating an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduledEvent {
    pub title: String,
    pub schedule_date_time: DateTime<Utc>,
    pub schedule_end_date_time: DateTime<Utc>,
    pub venue: String,
    pub organizer: String,
}

/// Complete event document as written on creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduledEvent {
    #[serde(flatten)]
    pub details: CreateScheduledEvent,
    pub description: String,
    pub thumbnail_file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
}

/// Partial event update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_end_date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
}

impl ScheduledEventPatch {
    pub fn thumbnail(filename: impl Into<String>) -> Self {
        Self {
            thumbnail_file_name: Some(filename.into()),
            ..Default::default()
        }
    }
}

/// Sortable event columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    ScheduleDateTime,
    Venue,
    Organizer,
    CreatedAt,
}

impl FromStr for EventField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "scheduleDateTime" | "schedule" => Ok(Self::ScheduleDateTime),
            "venue" => Ok(Self::Venue),
            "organizer" => Ok(Self::Organizer),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(DomainError::validation(format!(
                "Unknown event field: {}. Valid fields: title, scheduleDateTime, venue, organizer, createdAt",
                s
            ))),
        }
    }
}

impl Sortable for ScheduledEvent {
    type Field = EventField;

    fn sort_value(&self, field: EventField) -> SortValue {
        match field {
            EventField::Title => self.title.as_str().into(),
            EventField::ScheduleDateTime => self.schedule_date_time.into(),
            EventField::Venue => self.venue.as_str().into(),
            EventField::Organizer => self.organizer.as_str().into(),
            EventField::CreatedAt => self.created_at.into(),
        }
    }
}

impl Entity for ScheduledEvent {
    type Payload = NewScheduledEvent;
    type Patch = ScheduledEventPatch;

    fn id(&self) -> &str {
        &self.id
    }
}
