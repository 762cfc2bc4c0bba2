//! Cache domain - entries, policy, errors and the remote source contract

mod entry;
mod error;
mod policy;
mod sort;
mod source;

pub use entry::{CacheEntry, CacheRead};
pub use error::CacheError;
pub use policy::{CachePolicy, StaleFallback, DEFAULT_STALE_RETRY_AFTER, DEFAULT_TTL};
pub use sort::{Arranged, SortDirection, SortOrder, SortValue, Sortable};
pub use source::RemoteSource;

#[cfg(test)]
pub use source::mock;
