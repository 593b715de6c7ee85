//! Funnel Module
//!
//! Single-flight get-or-compute caching on top of the bounded store.

mod builder;
mod cache;
mod handle;

pub use builder::CacheBuilder;
pub use cache::FunnelCache;
pub use handle::Handle;
