//! Training applicants

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TrainingTag;
use crate::domain::DomainError;
use crate::domain::cache::{SortValue, Sortable};
use crate::domain::document::Entity;

pub const TRAINING_MEMBERS_COLLECTION: &str = "trainingMembers";

/// Progress of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    #[default]
    Applied,
    Accepted,
    Completed,
    Rejected,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Label shown to reviewers
    pub fn review_label(&self) -> &'static str {
        match self {
            Self::Applied => "Received",
            Self::Accepted | Self::Completed => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicantStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(Self::Applied),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::validation(format!(
                "Unknown applicant status: {}. Valid statuses: applied, accepted, completed, rejected",
                s
            ))),
        }
    }
}

/// File uploaded against a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedFile {
    pub title: String,
    pub filename: String,
}

/// A member's application to a training or opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub training_id: String,
    pub member_id: String,
    pub tag: TrainingTag,
    #[serde(default)]
    pub status: ApplicantStatus,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub required_files: Vec<SubmittedFile>,
    #[serde(default)]
    pub issued_certificate: Vec<String>,
}

impl Applicant {
    pub fn has_certificate(&self) -> bool {
        !self.issued_certificate.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplicant {
    pub training_id: String,
    pub member_id: String,
    pub tag: TrainingTag,
    pub status: ApplicantStatus,
    pub name: String,
    pub email: String,
    pub required_files: Vec<SubmittedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicantStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_certificate: Option<Vec<String>>,
}

impl ApplicantPatch {
    pub fn status(status: ApplicantStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicantField {
    Name,
    Email,
    Status,
    CreatedAt,
}

impl FromStr for ApplicantField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "status" => Ok(Self::Status),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(DomainError::validation(format!(
                "Unknown applicant field: {}",
                s
            ))),
        }
    }
}

impl Sortable for Applicant {
    type Field = ApplicantField;

    fn sort_value(&self, field: ApplicantField) -> SortValue {
        match field {
            ApplicantField::Name => self.name.as_str().into(),
            ApplicantField::Email => self.email.as_str().into(),
            ApplicantField::Status => self.status.as_str().into(),
            ApplicantField::CreatedAt => self.created_at.into(),
        }
    }
}

impl Entity for Applicant {
    type Payload = NewApplicant;
    type Patch = ApplicantPatch;

    fn id(&self) -> &str {
        &self.id
    }
}
