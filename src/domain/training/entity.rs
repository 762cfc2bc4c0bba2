//! Training and opportunity entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::cache::{SortValue, Sortable};
use crate::domain::document::Entity;

pub const TRAININGS_COLLECTION: &str = "trainings";

const MEGABYTE: u64 = 1024 * 1024;

/// Whether a training document is a training or a job opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrainingTag {
    #[default]
    Training,
    Opportunity,
}

impl TrainingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for TrainingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrainingTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(Self::Training),
            "opportunity" => Ok(Self::Opportunity),
            _ => Err(DomainError::validation(format!(
                "Unknown training tag: {}. Valid tags: training, opportunity",
                s
            ))),
        }
    }
}

/// A file applicants must upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequirement {
    pub title: String,
    /// MIME types accepted, e.g. `application/pdf` or `image/*`
    pub accepts: Vec<String>,
    /// Maximum size in bytes
    pub max_size: u64,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl FileRequirement {
    pub fn new(title: &str, accepts: &str, max_size: u64, required: bool) -> Self {
        Self {
            title: title.to_string(),
            accepts: vec![accepts.to_string()],
            max_size,
            required,
            description: String::new(),
        }
    }

    pub fn accepts_images(&self) -> bool {
        self.accepts.iter().any(|mime| mime.contains("image"))
    }
}

/// File requirements of a templated training
pub fn default_file_requirements() -> Vec<FileRequirement> {
    vec![
        FileRequirement::new("Curriculum Vitae", "application/pdf", 5 * MEGABYTE, true),
        FileRequirement::new("Identity Card", "image/*", 2 * MEGABYTE, true),
        FileRequirement::new("Motivation Letter", "application/pdf", 5 * MEGABYTE, false),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub tag: TrainingTag,
    pub title: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub thumbnail_file_name: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub file_requirements: Vec<FileRequirement>,
}

/// Fields an admin fills in when creating a training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTraining {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Complete training document as written on creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTraining {
    pub tag: TrainingTag,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub description: String,
    pub thumbnail_file_name: String,
    pub attachments: Vec<String>,
    pub file_requirements: Vec<FileRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_requirements: Option<Vec<FileRequirement>>,
}

impl TrainingPatch {
    pub fn thumbnail(filename: impl Into<String>) -> Self {
        Self {
            thumbnail_file_name: Some(filename.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingField {
    Title,
    DueDate,
    CreatedAt,
}

impl FromStr for TrainingField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "dueDate" | "deadline" => Ok(Self::DueDate),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(DomainError::validation(format!(
                "Unknown training field: {}. Valid fields: title, dueDate, createdAt",
                s
            ))),
        }
    }
}

impl Sortable for Training {
    type Field = TrainingField;

    fn sort_value(&self, field: TrainingField) -> SortValue {
        match field {
            TrainingField::Title => self.title.as_str().into(),
            TrainingField::DueDate => self.due_date.into(),
            TrainingField::CreatedAt => self.created_at.into(),
        }
    }
}

impl Entity for Training {
    type Payload = NewTraining;
    type Patch = TrainingPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trips_through_str() {
        assert_eq!("opportunity".parse::<TrainingTag>().unwrap(), TrainingTag::Opportunity);
        assert_eq!(TrainingTag::Training.to_string(), "training");
        assert!("course".parse::<TrainingTag>().is_err());
    }

    #[test]
    fn test_default_requirements() {
        let requirements = default_file_requirements();

        assert!(requirements.iter().any(|r| r.required));
        assert!(requirements.iter().any(FileRequirement::accepts_images));
    }
}
