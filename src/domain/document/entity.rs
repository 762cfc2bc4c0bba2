//! Entities persisted as documents

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::DomainError;
use crate::domain::cache::Sortable;

/// A record type stored in one document collection
pub trait Entity:
    Clone + Debug + Send + Sync + Serialize + DeserializeOwned + Sortable + 'static
{
    /// Fields supplied on creation
    type Payload: Serialize + Send + 'static;
    /// Partial update
    type Patch: Serialize + Send + 'static;

    fn id(&self) -> &str;
}

/// Serializes a payload or patch into document fields
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, DomainError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DomainError::validation(format!(
            "Expected an object, got {}",
            other
        ))),
        Err(e) => Err(DomainError::validation(format!("Unserializable fields: {}", e))),
    }
}
