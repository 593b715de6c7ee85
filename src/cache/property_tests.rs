//! Property-Based Tests for the Bounded Store
//!
//! Uses proptest to check capacity, recency and disposal accounting against
//! a simple reference model.

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::BoundedStore;

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = u32> {
    any::<u32>()
}

/// A single store operation
#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Delete { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        key_strategy().prop_map(|key| StoreOp::Get { key }),
        key_strategy().prop_map(|key| StoreOp::Delete { key }),
    ]
}

// == Reference Model ==
/// Naive LRU: front = least recently used.
#[derive(Default)]
struct ModelLru {
    order: VecDeque<String>,
    values: HashMap<String, u32>,
}

impl ModelLru {
    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
    }

    fn set(&mut self, key: &str, value: u32, capacity: usize) {
        if !self.values.contains_key(key) && self.values.len() >= capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.values.remove(&oldest);
            }
        }
        self.values.insert(key.to_string(), value);
        self.touch(key);
    }

    fn get(&mut self, key: &str) -> Option<u32> {
        let value = self.values.get(key).copied();
        if value.is_some() {
            self.touch(key);
        }
        value
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
        self.order.retain(|k| k != key);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Entry count never exceeds capacity, whatever the operation mix.
    #[test]
    fn prop_capacity_enforcement(
        capacity in 1usize..6,
        ops in prop::collection::vec(store_op_strategy(), 1..100)
    ) {
        let mut store = BoundedStore::new(Some(capacity), None);

        for op in ops {
            match op {
                StoreOp::Set { key, value } => store.set(key, value, None),
                StoreOp::Get { key } => { store.get(&key); }
                StoreOp::Delete { key } => { store.delete(&key); }
            }
            prop_assert!(
                store.len() <= capacity,
                "Store size {} exceeds capacity {}",
                store.len(),
                capacity
            );
        }
    }

    // Reads and writes both promote recency, so the store agrees with a
    // naive LRU model on every lookup.
    #[test]
    fn prop_matches_lru_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(store_op_strategy(), 1..100)
    ) {
        let mut store = BoundedStore::new(Some(capacity), None);
        let mut model = ModelLru::default();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    model.set(&key, value, capacity);
                    store.set(key, value, None);
                }
                StoreOp::Get { key } => {
                    prop_assert_eq!(store.get(&key).copied(), model.get(&key));
                }
                StoreOp::Delete { key } => {
                    model.delete(&key);
                    store.delete(&key);
                }
            }
            prop_assert_eq!(store.len(), model.values.len());
        }
    }

    // Every entry that ever entered the store is disposed exactly once by
    // the time the store is cleared.
    #[test]
    fn prop_disposal_accounting(
        capacity in 1usize..6,
        ops in prop::collection::vec(store_op_strategy(), 1..100)
    ) {
        let disposed = Arc::new(AtomicUsize::new(0));
        let counter = disposed.clone();
        let mut store = BoundedStore::new(Some(capacity), None)
            .with_dispose(move |_: String, _: u32| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let mut inserted = 0usize;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    inserted += 1;
                    store.set(key, value, None);
                }
                StoreOp::Get { key } => { store.get(&key); }
                StoreOp::Delete { key } => { store.delete(&key); }
            }
            prop_assert_eq!(disposed.load(Ordering::SeqCst) + store.len(), inserted);
        }

        store.clear();
        prop_assert_eq!(disposed.load(Ordering::SeqCst), inserted);
    }

    // Hits and misses add up to the number of lookups.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(store_op_strategy(), 1..50)) {
        let mut store = BoundedStore::new(Some(4), None);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => store.set(key, value, None),
                StoreOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                StoreOp::Delete { key } => { store.delete(&key); }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }
}
