//! Read-only projections of one slice out of the [`StateTree`].

use crate::constants::ActionTypes;
use crate::slot::SlotKey;
use crate::state::{SliceState, StateTree};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A selector with its slot already resolved.
pub type BoxedSelector<V> = Box<dyn Fn(&StateTree) -> Option<V> + Send + Sync>;

/// Selectors of one slice.
///
/// Every read is tolerant: a missing slice, a missing slot, or a slice of
/// another type reads as `None`.
pub struct Selectors<T, D, E> {
    path: Arc<str>,
    _payload: PhantomData<fn() -> (T, D, E)>,
}

impl<T, D, E> Selectors<T, D, E>
where
    T: Clone + 'static,
    D: Clone + 'static,
    E: Clone + 'static,
{
    /// Selectors reading at `types.common_path`
    #[must_use]
    pub fn new(types: &ActionTypes) -> Self {
        Self {
            path: Arc::from(types.common_path.as_str()),
            _payload: PhantomData,
        }
    }

    /// The whole slice, if it exists
    #[must_use]
    pub fn slice<'t>(&self, tree: &'t StateTree) -> Option<&'t SliceState<T, D, E>> {
        tree.slice_at(&self.path)
    }

    /// Whether a request is in progress at `slot`
    #[must_use]
    pub fn fetching_status(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<bool> {
        self.slice(tree)?.fetching().get(slot).copied()
    }

    /// Formatted data at `slot`
    #[must_use]
    pub fn data(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<D> {
        self.slice(tree)?.data().get(slot).cloned()
    }

    /// Raw data at `slot`
    #[must_use]
    pub fn raw_data(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<T> {
        self.slice(tree)?.raw_data().get(slot).cloned()
    }

    /// Formatted error at `slot`
    #[must_use]
    pub fn error(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<E> {
        self.slice(tree)?.error().get(slot).cloned()
    }
}

impl<T, D, E> Clone for Selectors<T, D, E> {
    fn clone(&self) -> Self {
        Self {
            path: Arc::clone(&self.path),
            _payload: PhantomData,
        }
    }
}

impl<T, D, E> fmt::Debug for Selectors<T, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selectors").field("path", &self.path).finish()
    }
}
