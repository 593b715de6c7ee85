//! Computation Handle Module
//!
//! A settle-once, readable-many reference to a value that is being computed
//! or has been computed.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{self, BoxFuture, FutureExt, Shared};

use crate::error::{self, CacheError};

type Computation<V, E> = Shared<BoxFuture<'static, Result<V, CacheError<E>>>>;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

// == Handle ==
/// The value for a key, eventually.
///
/// Cloning a handle is cheap and every clone observes the same single
/// computation: it is started at most once and settles exactly once, either
/// to a value or to a [`CacheError`]. Each handle carries a process-unique id
/// so the cache can tell a failed handle apart from a newer one stored under
/// the same key.
pub struct Handle<V, E> {
    id: u64,
    computation: Computation<V, E>,
}

impl<V, E> Clone for Handle<V, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            computation: self.computation.clone(),
        }
    }
}

impl<V, E> Handle<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a pending handle that runs `compute` on first poll.
    ///
    /// `compute` itself is only invoked inside the handle's future, so a
    /// panic raised while calling it and a panic raised while polling the
    /// future it returns both settle the handle as
    /// [`CacheError::Panicked`], the same way an `Err` settles it as
    /// [`CacheError::Compute`].
    pub fn from_fn<F, Fut>(compute: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let computation = AssertUnwindSafe(async move { compute().await })
            .catch_unwind()
            .map(|outcome| match outcome {
                Ok(result) => result.map_err(CacheError::Compute),
                Err(payload) => Err(CacheError::Panicked(panic_message(payload.as_ref()))),
            })
            .boxed()
            .shared();

        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            computation,
        }
    }

    /// Creates a pending handle around an in-flight computation.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self::from_fn(move || future)
    }

    /// Creates a handle that is already settled with `result`.
    pub fn from_result(result: Result<V, E>) -> Self {
        let handle = Self::from_fn(move || future::ready(result));
        // A ready future settles on its first poll, which makes `peek` see it.
        let _ = handle.computation.clone().now_or_never();
        handle
    }

    /// Creates a handle already fulfilled with `value`.
    pub fn ready(value: V) -> Self {
        Self::from_result(Ok(value))
    }

    /// Waits for the computation to settle and returns its outcome.
    ///
    /// Any number of callers may wait concurrently; all of them receive a
    /// clone of the same outcome.
    pub async fn settled(&self) -> error::Result<V, E> {
        self.computation.clone().await
    }
}

impl<V, E> Handle<V, E> {
    /// Process-unique identifier of this handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the outcome if the computation has already settled.
    pub fn peek(&self) -> Option<&Result<V, CacheError<E>>>
    where
        V: Clone,
        E: Clone,
    {
        self.computation.peek()
    }

    /// Returns true once the computation has settled either way.
    pub fn is_settled(&self) -> bool
    where
        V: Clone,
        E: Clone,
    {
        self.peek().is_some()
    }

    /// Returns true once the computation has settled with an error.
    pub fn is_failed(&self) -> bool
    where
        V: Clone,
        E: Clone,
    {
        matches!(self.peek(), Some(Err(_)))
    }

    /// Returns true if both handles refer to the same computation.
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V, E> fmt::Debug for Handle<V, E>
where
    V: Clone + fmt::Debug,
    E: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("outcome", &self.peek())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
