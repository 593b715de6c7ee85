//! Error types for the cache
//!
//! Provides the failure outcome of a funnelled computation using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Failure delivered to every caller waiting on a computation.
///
/// The cache never wraps, retries or rewrites a compute error: `Compute`
/// carries the caller's own error value as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError<E> {
    /// The compute function returned an error
    #[error("{0}")]
    Compute(E),

    /// The compute function panicked before settling
    #[error("Computation panicked: {0}")]
    Panicked(String),
}

impl<E> CacheError<E> {
    /// Returns the compute error, if this failure came from one.
    pub fn into_compute(self) -> Option<E> {
        match self {
            CacheError::Compute(err) => Some(err),
            CacheError::Panicked(_) => None,
        }
    }

    /// Returns true if the computation panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, CacheError::Panicked(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache lookups.
pub type Result<T, E> = std::result::Result<T, CacheError<E>>;
