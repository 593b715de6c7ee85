//! Funnel Cache Module
//!
//! The get-or-compute surface: single-flight computation per key layered
//! over the bounded store, with failed computations evicted automatically.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::{BoundedStore, CacheStats};
use crate::config::Config;
use crate::error;
use crate::funnel::{CacheBuilder, Handle};
use crate::tasks::spawn_prune_task;

type Store<K, V, E> = RwLock<BoundedStore<K, Handle<V, E>>>;

// == Funnel Cache ==
/// In-memory LRU + TTL cache that computes each missing value once.
///
/// The store holds [`Handle`]s rather than plain values. A miss stores a
/// pending handle before its computation has settled, so concurrent callers
/// asking for the same key join that one computation instead of starting
/// their own. A handle that fails is removed from the cache as soon as the
/// failure happens, whether or not anyone is waiting on it; the next lookup
/// for that key computes afresh.
///
/// Cloning a `FunnelCache` is cheap and every clone shares the same store.
/// Computations are driven by tasks spawned on the tokio runtime, so every
/// method that stores a handle must be called from within one.
pub struct FunnelCache<K, V, E> {
    store: Arc<Store<K, V, E>>,
}

impl<K, V, E> Clone for FunnelCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<K, V, E> fmt::Debug for FunnelCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunnelCache").finish_non_exhaustive()
    }
}

impl<K, V, E> Default for FunnelCache<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> FunnelCache<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an unbounded cache without a default TTL.
    pub fn new() -> Self {
        CacheBuilder::new().build()
    }

    /// Starts a [`CacheBuilder`] for a cache with custom limits.
    pub fn builder() -> CacheBuilder<K, V, E> {
        CacheBuilder::new()
    }

    /// Creates a cache with the limits in `config`.
    pub fn from_config(config: &Config) -> Self {
        CacheBuilder::from_config(config).build()
    }

    pub(crate) fn from_store(store: BoundedStore<K, Handle<V, E>>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    // == Get ==
    /// Returns the cached value for `key`, or `Ok(None)` if nothing is cached.
    ///
    /// If the key's computation is still in flight this waits for it, and a
    /// failure of that computation is returned as the error.
    pub async fn get<Q>(&self, key: &Q) -> error::Result<Option<V>, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = {
            let mut store = self.store.write().await;
            lookup(&mut *store, key)
        };

        match handle {
            Some(handle) => self.join(key, handle).await.map(Some),
            None => Ok(None),
        }
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, computing it with `compute` on a
    /// miss.
    ///
    /// Concurrent calls for the same missing key run `compute` once and all
    /// receive its outcome. On failure every waiting caller gets the error
    /// and the entry is gone, so a later call runs its own `compute`.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> error::Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.get_or_compute_with_ttl(key, compute, None).await
    }

    /// Like [`get_or_compute`](Self::get_or_compute), storing a computed
    /// entry with `ttl` instead of the default TTL.
    pub async fn get_or_compute_with_ttl<F, Fut>(
        &self,
        key: K,
        compute: F,
        ttl: Option<Duration>,
    ) -> error::Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let handle = {
            let mut store = self.store.write().await;
            match lookup(&mut *store, &key) {
                Some(handle) => {
                    trace!("Joining computation {}", handle.id());
                    handle
                }
                None => {
                    let handle = Handle::from_fn(compute);
                    trace!("Starting computation {}", handle.id());
                    self.insert(&mut store, key.clone(), handle.clone(), ttl);
                    handle
                }
            }
        };

        self.join(&key, handle).await
    }

    /// Synchronous flavour of [`get_or_compute`](Self::get_or_compute).
    ///
    /// `compute` goes through the same handle as an asynchronous
    /// computation: its error, or a panic inside it, is delivered the same
    /// way and leaves nothing cached.
    pub async fn get_or_insert_with<F>(&self, key: K, compute: F) -> error::Result<V, E>
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
    {
        self.get_or_compute(key, move || future::ready(compute())).await
    }

    // == Set ==
    /// Stores an already computed value.
    pub async fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let mut store = self.store.write().await;
        self.insert(&mut store, key, Handle::ready(value), ttl);
    }

    /// Stores a computation that is still in flight.
    ///
    /// Lookups for `key` join it right away. If it fails, the entry is
    /// evicted as soon as the failure happens, even if nobody is waiting.
    pub async fn set_future<Fut>(&self, key: K, future: Fut, ttl: Option<Duration>)
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut store = self.store.write().await;
        self.insert(&mut store, key, Handle::from_future(future), ttl);
    }

    // == Delete / Reset / Prune ==
    /// Removes the entry for `key`, returning whether one was present.
    pub async fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.write().await.delete(key)
    }

    /// Removes every entry.
    pub async fn reset(&self) {
        self.store.write().await.clear();
    }

    /// Removes every expired entry, returning how many were removed.
    pub async fn prune(&self) -> usize {
        self.store.write().await.prune()
    }

    // == Configured Pruning ==
    /// Spawns the background prune task if `config` sets a prune interval.
    ///
    /// Returns `None` when pruning is disabled, leaving expired entries to be
    /// reclaimed lazily on read.
    pub fn spawn_configured_pruning(&self, config: &Config) -> Option<JoinHandle<()>> {
        config
            .prune_interval()
            .map(|interval| spawn_prune_task(self.clone(), interval))
    }

    // == Inspection ==
    /// Returns true if a live, not failed entry exists for `key`.
    ///
    /// Does not affect recency.
    pub async fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store
            .read()
            .await
            .peek(key)
            .is_some_and(|handle| !handle.is_failed())
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the store's counters.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Store<K, V, E> {
        &self.store
    }

    // == Internals ==
    /// Stores `handle` and arranges for it to be evicted if it fails.
    fn insert(
        &self,
        store: &mut BoundedStore<K, Handle<V, E>>,
        key: K,
        handle: Handle<V, E>,
        ttl: Option<Duration>,
    ) {
        store.set(key.clone(), handle.clone(), ttl);

        if handle.is_failed() {
            evict_failed(store, &key, handle.id());
        } else if !handle.is_settled() {
            self.watch(key, handle);
        }
    }

    /// Drives `handle` to completion in the background and evicts it on
    /// failure.
    ///
    /// Keeps the computation running even if every caller stops waiting,
    /// and only holds a weak reference to the store.
    fn watch(&self, key: K, handle: Handle<V, E>) {
        let store: Weak<Store<K, V, E>> = Arc::downgrade(&self.store);

        tokio::spawn(async move {
            if handle.settled().await.is_ok() {
                return;
            }
            if let Some(store) = store.upgrade() {
                evict_failed(&mut *store.write().await, &key, handle.id());
            }
        });
    }

    /// Waits on `handle`; a caller that observes a failure evicts it before
    /// returning, so the next lookup never sees it.
    async fn join<Q>(&self, key: &Q, handle: Handle<V, E>) -> error::Result<V, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let outcome = handle.settled().await;
        if outcome.is_err() {
            evict_failed(&mut *self.store.write().await, key, handle.id());
        }
        outcome
    }
}

/// Looks up a usable handle, promoting it to most recently used.
///
/// A handle that has already failed is evicted on the spot and reported as
/// absent.
fn lookup<K, V, E, Q>(store: &mut BoundedStore<K, Handle<V, E>>, key: &Q) -> Option<Handle<V, E>>
where
    K: Hash + Eq + Clone + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
    E: Clone,
{
    let handle = store.get(key)?.clone();
    if handle.is_failed() {
        evict_failed(store, key, handle.id());
        return None;
    }
    Some(handle)
}

/// Removes the entry for `key` only if it still holds handle `id`.
///
/// A newer handle stored under the same key after the failed one is left
/// alone.
fn evict_failed<K, V, E, Q>(store: &mut BoundedStore<K, Handle<V, E>>, key: &Q, id: u64)
where
    K: Hash + Eq + Clone + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
{
    if store.delete_if(key, |current| current.id() == id) {
        store.record_failure();
        debug!("Evicted failed computation {}", id);
    }
}
