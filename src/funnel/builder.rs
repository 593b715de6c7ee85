//! Cache Builder
//!
//! Construction-time options for a [`FunnelCache`].

use std::hash::Hash;
use std::time::Duration;

use crate::cache::{BoundedStore, DisposeFn};
use crate::config::Config;
use crate::funnel::{FunnelCache, Handle};

/// Builds a [`FunnelCache`] with capacity, default TTL and disposal options.
///
/// ```ignore
/// let cache: FunnelCache<String, u64, String> = FunnelCache::builder()
///     .capacity(1000)
///     .default_ttl(Duration::from_secs(30))
///     .on_dispose(|key, _handle| tracing::debug!("dropped {key}"))
///     .build();
/// ```
pub struct CacheBuilder<K, V, E> {
    capacity: Option<usize>,
    default_ttl: Option<Duration>,
    on_dispose: Option<DisposeFn<K, Handle<V, E>>>,
}

impl<K, V, E> Default for CacheBuilder<K, V, E> {
    fn default() -> Self {
        Self {
            capacity: None,
            default_ttl: None,
            on_dispose: None,
        }
    }
}

impl<K, V, E> CacheBuilder<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Starts with no capacity bound, no default TTL and no disposal callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the limits in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            capacity: config.capacity,
            default_ttl: config.default_ttl(),
            on_dispose: None,
        }
    }

    // == Options ==
    /// Maximum number of entries before LRU eviction. Zero means unbounded.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// TTL applied to entries set without an explicit one.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Callback invoked once for every entry leaving the cache, for any
    /// reason: capacity eviction, expiry, replacement, delete, reset or a
    /// failed computation.
    ///
    /// It runs while the cache is locked and must not call back into it.
    pub fn on_dispose<F>(mut self, on_dispose: F) -> Self
    where
        F: Fn(K, Handle<V, E>) + Send + Sync + 'static,
    {
        self.on_dispose = Some(Box::new(on_dispose));
        self
    }

    // == Build ==
    /// Creates the cache with the configured options.
    pub fn build(self) -> FunnelCache<K, V, E> {
        let store = BoundedStore::new(self.capacity, self.default_ttl);
        let store = match self.on_dispose {
            Some(on_dispose) => store.with_dispose(on_dispose),
            None => store,
        };
        FunnelCache::from_store(store)
    }
}
