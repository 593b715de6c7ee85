//! TTL Prune Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::funnel::FunnelCache;

/// Spawns a background task that prunes expired entries from `cache`.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. Expired entries are reclaimed lazily on read anyway; this task
/// only bounds how long expired entries nobody reads keep their memory.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort it.
///
/// # Example
/// ```ignore
/// let cache = FunnelCache::<String, u64, String>::from_config(&config);
/// let prune_handle = spawn_prune_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
///
/// [`FunnelCache::spawn_configured_pruning`] does the same using the
/// interval from a [`Config`](crate::Config), if one is set.
pub fn spawn_prune_task<K, V, E>(
    cache: FunnelCache<K, V, E>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL prune task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.prune().await;

            if removed > 0 {
                info!("TTL prune: removed {} expired entries", removed);
            } else {
                debug!("TTL prune: no expired entries found");
            }
        }
    })
}
