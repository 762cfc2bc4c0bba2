//! Document store domain - documents, queries and persisted entities

mod document;
mod entity;
mod store;

pub use document::{Document, Filter, Query, sort_value_of};
pub use entity::{Entity, to_fields};
pub use store::DocumentStore;
