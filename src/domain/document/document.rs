//! Documents and queries of the document store

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::DomainError;
use crate::domain::cache::{SortDirection, SortValue};

/// A stored document: server-assigned metadata plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            created_at,
            updated_at: None,
            data,
        }
    }

    /// Field value, including the `id` and `createdAt` metadata fields
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "createdAt" => Some(Value::String(self.created_at.to_rfc3339())),
            "updatedAt" => self.updated_at.map(|t| Value::String(t.to_rfc3339())),
            _ => self.data.get(name).cloned(),
        }
    }

    /// Shallow merge of `patch` into the fields
    pub fn merge(&mut self, patch: Map<String, Value>, now: DateTime<Utc>) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
        self.updated_at = Some(now);
    }

    /// Deserializes the document with its metadata folded into the fields
    pub fn into_entity<E: DeserializeOwned>(self) -> Result<E, DomainError> {
        let mut object = self.data;
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        if let Some(updated_at) = self.updated_at {
            object.insert("updatedAt".to_string(), Value::String(updated_at.to_rfc3339()));
        }

        serde_json::from_value(Value::Object(object)).map_err(|e| {
            DomainError::storage(format!("Malformed document '{}': {}", self.id, e))
        })
    }
}

/// Converts a JSON value to its sortable form; RFC 3339 strings are timestamps
pub fn sort_value_of(value: Option<&Value>) -> SortValue {
    match value {
        None | Some(Value::Null) => SortValue::Missing,
        Some(Value::Bool(b)) => SortValue::Number(if *b { 1.0 } else { 0.0 }),
        Some(Value::Number(n)) => n.as_f64().map(SortValue::Number).unwrap_or(SortValue::Missing),
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => SortValue::Timestamp(ts.with_timezone(&Utc)),
            Err(_) => SortValue::Text(s.clone()),
        },
        Some(other) => SortValue::Text(other.to_string()),
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Query filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value
    Eq { field: String, value: Value },
    /// Field is set (non-null, non-empty) or not
    Present { field: String, present: bool },
}

impl Filter {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Eq { field, value } => document.field(field).as_ref() == Some(value),
            Self::Present { field, present } => {
                is_present(document.field(field).as_ref()) == *present
            }
        }
    }
}

/// Filtered, optionally ordered query over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, SortDirection)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn where_present(mut self, field: impl Into<String>, present: bool) -> Self {
        self.filters.push(Filter::Present {
            field: field.into(),
            present,
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }

    /// Filters and orders `documents`
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|document| self.matches(document))
            .collect();

        if let Some((field, direction)) = &self.order_by {
            matched.sort_by(|a, b| {
                let ordering = sort_value_of(a.field(field).as_ref())
                    .natural_cmp(&sort_value_of(b.field(field).as_ref()));
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        matched
    }
}
