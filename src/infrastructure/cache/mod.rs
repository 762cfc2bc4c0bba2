//! Cache infrastructure - entity and list caches

mod entity_cache;
mod keyed;
mod list_cache;

pub use entity_cache::EntityCache;
pub use list_cache::ListCache;
