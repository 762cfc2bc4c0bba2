//! Blob store infrastructure

mod cached_resolver;
mod in_memory;

pub use cached_resolver::CachedBlobResolver;
pub use in_memory::InMemoryBlobStore;
