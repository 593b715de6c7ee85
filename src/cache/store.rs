//! Bounded Store Module
//!
//! Main storage engine combining HashMap storage with LRU tracking, TTL
//! expiration and a disposal callback.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::{CacheStats, Entry, LruTracker};

/// Callback invoked with the key and value of every entry leaving the store.
pub type DisposeFn<K, V> = Box<dyn Fn(K, V) + Send + Sync>;

// == Bounded Store ==
/// Capacity- and TTL-bounded storage with LRU eviction.
///
/// Expiry is lazy: `get`, `peek` and `contains` treat expired entries as
/// absent, and `get` also removes them. `prune` is the only sweep that
/// reclaims expired entries nobody reads. The store runs no timer of its own.
///
/// Every entry that leaves the store, whether by capacity eviction, expiry,
/// replacement, `delete` or `clear`, is handed to the disposal callback
/// exactly once.
pub struct BoundedStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, Entry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed, None = unbounded
    capacity: Option<usize>,
    /// TTL for entries set without an explicit one
    default_ttl: Option<Duration>,
    /// Disposal callback
    on_dispose: Option<DisposeFn<K, V>>,
}

impl<K, V> fmt::Debug for BoundedStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedStore")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats)
            .field("on_dispose", &self.on_dispose.is_some())
            .finish()
    }
}

impl<K, V> BoundedStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new BoundedStore with optional capacity and default TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries; `None` or `Some(0)` is unbounded
    /// * `default_ttl` - TTL for entries set without an explicit one
    pub fn new(capacity: Option<usize>, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity: capacity.filter(|c| *c > 0),
            default_ttl,
            on_dispose: None,
        }
    }

    /// Sets the disposal callback.
    ///
    /// The callback runs synchronously inside the store operation that
    /// removed the entry.
    pub fn with_dispose<F>(mut self, on_dispose: F) -> Self
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        self.on_dispose = Some(Box::new(on_dispose));
        self
    }

    // == Set ==
    /// Stores a value with an optional TTL override.
    ///
    /// If the key already exists its previous value is disposed and replaced,
    /// and its TTL restarts. If the key is new and the store is at capacity,
    /// the least recently used entry is evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let previous_tick = self.entries.get(&key).map(|entry| entry.tick);

        if previous_tick.is_none() {
            self.evict_to_fit();
        }

        let tick = self.lru.touch(key.clone(), previous_tick);
        let entry = Entry::new(value, ttl.or(self.default_ttl), Instant::now(), tick);

        if let Some(replaced) = self.entries.insert(key.clone(), entry) {
            self.dispose(key, replaced.value);
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a live value and marks it as most recently used.
    ///
    /// An expired entry is removed and reported as absent. Reads never extend
    /// an entry's TTL.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (stored_key, expired) = match self.entries.get_key_value(key) {
            Some((stored_key, entry)) => (stored_key.clone(), entry.is_expired()),
            None => {
                trace!("Store miss");
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            trace!("Store miss on expired entry");
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.tick = self.lru.touch(stored_key, Some(entry.tick));
        self.stats.record_hit();
        Some(&entry.value)
    }

    // == Peek ==
    /// Retrieves a live value without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.value)
    }

    /// Returns true if a live entry exists for the key.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key).is_some()
    }

    // == Delete ==
    /// Removes an entry by key, returning whether one was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key)
    }

    /// Removes an entry only if `predicate` accepts its current value.
    pub fn delete_if<Q, F>(&mut self, key: &Q, predicate: F) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> bool,
    {
        let matches = self
            .entries
            .get(key)
            .is_some_and(|entry| predicate(&entry.value));

        matches && self.remove_entry(key)
    }

    // == Clear ==
    /// Removes every entry, disposing each one.
    pub fn clear(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        self.lru.clear();
        self.stats.set_total_entries(0);

        debug!("Clearing {} entries", entries.len());
        for (key, entry) in entries {
            self.dispose(key, entry.value);
        }
    }

    // == Prune ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.remove_entry(&key);
        }

        self.stats.record_expirations(count);
        if count > 0 {
            debug!("Pruned {} expired entries", count);
        }
        count
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Counts an entry removed because its computation failed.
    pub fn record_failure(&mut self) {
        self.stats.record_failure();
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet
    /// reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Limits ==
    /// Maximum number of entries, None = unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// TTL applied to entries stored without one.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    // == Internals ==
    /// Evicts least recently used entries until one more fits.
    fn evict_to_fit(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };

        while self.entries.len() >= capacity {
            let Some(oldest) = self.lru.evict_oldest() else {
                break;
            };
            if let Some((key, entry)) = self.entries.remove_entry(&oldest) {
                self.stats.record_eviction();
                debug!("Evicted least recently used entry at capacity {}", capacity);
                self.dispose(key, entry.value);
            }
        }
    }

    fn remove_entry<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.remove_entry(key) {
            Some((key, entry)) => {
                self.lru.remove(entry.tick);
                self.stats.set_total_entries(self.entries.len());
                self.dispose(key, entry.value);
                true
            }
            None => false,
        }
    }

    fn dispose(&self, key: K, value: V) {
        if let Some(on_dispose) = &self.on_dispose {
            on_dispose(key, value);
        }
    }
}
