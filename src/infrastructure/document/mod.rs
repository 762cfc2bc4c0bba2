//! Document store infrastructure

mod in_memory;
mod source;

pub use in_memory::InMemoryDocumentStore;
pub use source::{CollectionSource, ScopedQuery};
