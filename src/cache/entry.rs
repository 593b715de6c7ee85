//! Cache Entry Module
//!
//! Defines the structure for individual store entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Entry ==
/// A single stored value with expiry and recency metadata.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Recency stamp assigned by the LRU tracker
    pub tick: u64,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` after `now`, if a TTL is given.
    pub fn new(value: V, ttl: Option<Duration>, now: Instant, tick: u64) -> Self {
        Self {
            value,
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            tick,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so an entry with TTL `t`
    /// is live strictly before `t` has elapsed. This is the only expiry check
    /// in the store; reads and prune sweeps both go through it.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks if the entry has expired as of the current instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}
