//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for store eviction.

use std::collections::BTreeMap;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch hands out a fresh, strictly increasing tick. Keys are kept in
/// a BTreeMap ordered by tick where:
/// - Lowest tick = Least recently used
/// - Highest tick = Most recently used
///
/// Callers store the tick next to their value and hand it back on the next
/// touch or removal, which keeps both operations logarithmic.
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Keys by access tick
    order: BTreeMap<u64, K>,
    /// Next tick to hand out
    next_tick: u64,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            next_tick: 0,
        }
    }

    // == Touch ==
    /// Marks a key as most recently used and returns its new tick.
    ///
    /// `previous` is the tick the key was last given, if it is already tracked.
    pub fn touch(&mut self, key: K, previous: Option<u64>) -> u64 {
        if let Some(tick) = previous {
            self.order.remove(&tick);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(tick, key);
        tick
    }

    // == Remove ==
    /// Stops tracking the key stamped with `tick`.
    pub fn remove(&mut self, tick: u64) -> Option<K> {
        self.order.remove(&tick)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    /// Returns true if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
    }
}
