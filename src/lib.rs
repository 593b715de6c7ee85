//! Funnel Cache - An in-memory cache that computes each missing value once
//!
//! Combines LRU capacity eviction and TTL expiration with single-flight
//! deduplication: concurrent requests for the same missing key share one
//! computation, and failed computations are never left in the cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod funnel;
pub mod tasks;

pub use cache::{BoundedStore, CacheStats};
pub use config::Config;
pub use error::CacheError;
pub use funnel::{CacheBuilder, FunnelCache, Handle};
pub use tasks::spawn_prune_task;
