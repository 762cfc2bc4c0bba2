//! Member domain - registered individuals and organizations

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::cache::{SortValue, Sortable};
use crate::domain::document::Entity;

pub const MEMBERS_COLLECTION: &str = "users";

/// Account type, derived from whether the member names an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    #[default]
    Individual,
    Organization,
}

impl MemberType {
    pub const ALL: [MemberType; 2] = [MemberType::Individual, MemberType::Organization];

    /// Query tag of the member list of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(Self::Individual),
            "organization" => Ok(Self::Organization),
            _ => Err(DomainError::validation(format!(
                "Unknown member type: {}. Valid types: individual, organization",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl Member {
    pub fn member_type(&self) -> MemberType {
        match self.organization.as_deref() {
            Some(name) if !name.is_empty() => MemberType::Organization,
            _ => MemberType::Individual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberField {
    Name,
    Email,
    Organization,
    CreatedAt,
}

impl FromStr for MemberField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "organization" => Ok(Self::Organization),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(DomainError::validation(format!("Unknown member field: {}", s))),
        }
    }
}

impl Sortable for Member {
    type Field = MemberField;

    fn sort_value(&self, field: MemberField) -> SortValue {
        match field {
            MemberField::Name => self.name.as_str().into(),
            MemberField::Email => self.email.as_str().into(),
            MemberField::Organization => self.organization.as_deref().into(),
            MemberField::CreatedAt => self.created_at.into(),
        }
    }
}

impl Entity for Member {
    type Payload = NewMember;
    type Patch = MemberPatch;

    fn id(&self) -> &str {
        &self.id
    }
}
