//! Cache Module
//!
//! Provides the bounded in-memory store with TTL expiration and LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::Entry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{BoundedStore, DisposeFn};
