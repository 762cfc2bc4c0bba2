//! Seetrum dashboard cache
//!
//! Read-through caches for the dashboard's document-backed entities:
//! - Per-key entity caches with TTL, invalidation and write-through
//! - Per-query list caches with client-side sorting
//! - Coalescing of concurrent fetches for the same key
//! - Optional stale-on-error fallback

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
mod registry;

pub use config::AppConfig;
pub use registry::CacheRegistry;
