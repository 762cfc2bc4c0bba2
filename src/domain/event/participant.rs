//! Event participant entity

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::cache::{SortValue, Sortable};
use crate::domain::document::Entity;

pub const EVENT_MEMBERS_COLLECTION: &str = "eventMembers";

/// A member registered for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipant {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub event_id: String,
    pub member_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventParticipant {
    pub event_id: String,
    pub member_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantField {
    Name,
    Email,
    CreatedAt,
}

impl FromStr for ParticipantField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(DomainError::validation(format!(
                "Unknown participant field: {}",
                s
            ))),
        }
    }
}

impl Sortable for EventParticipant {
    type Field = ParticipantField;

    fn sort_value(&self, field: ParticipantField) -> SortValue {
        match field {
            ParticipantField::Name => self.name.as_str().into(),
            ParticipantField::Email => self.email.as_str().into(),
            ParticipantField::CreatedAt => self.created_at.into(),
        }
    }
}

impl Entity for EventParticipant {
    type Payload = NewEventParticipant;
    type Patch = EventParticipantPatch;

    fn id(&self) -> &str {
        &self.id
    }
}
