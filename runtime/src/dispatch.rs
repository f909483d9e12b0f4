//! The dispatch seam between action creators and whatever owns the state.
//!
//! Thunk-style orchestration (read state, decide, dispatch) is written
//! against [`Dispatcher`] rather than a concrete [`Store`](crate::Store), so
//! the same code runs against the live store in production and against a
//! recording double in tests.

use crate::error::StoreError;
use std::future::Future;

/// Something that accepts actions and exposes read access to state.
///
/// Implementations must apply dispatched actions in the order `dispatch`
/// futures complete, and `select` must observe every action whose
/// `dispatch` future already resolved.
pub trait Dispatcher<S, A>: Clone + Send + Sync + 'static {
    /// Dispatch an action into the reducer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] when the underlying store
    /// no longer accepts actions.
    fn dispatch(&self, action: A) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read current state through a closure.
    fn select<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&S) -> T + Send,
        T: Send;
}
