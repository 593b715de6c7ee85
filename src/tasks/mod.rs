//! Background Tasks Module
//!
//! Optional caller-driven maintenance; the store itself never runs a timer.
//!
//! # Tasks
//! - Prune: Removes expired cache entries at a fixed interval

mod prune;

pub use prune::spawn_prune_task;
