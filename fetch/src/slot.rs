//! Slot keys: which part of a slice a set of call parameters addresses.
//!
//! A slice either has a single implicit slot (no memoizer configured) or one
//! slot per distinct memoized parameter set. [`merge_fields_at_slot`] is the
//! only way the reducer writes slice fields, so every event honours the same
//! addressing mode.

use crate::state::{SliceState, SlotMode};
use std::fmt;
use std::sync::Arc;

/// Derived identifier of one parameter set within a slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(Arc<str>);

impl SlotKey {
    /// Wrap an already-derived key
    #[must_use]
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SlotKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// User-supplied function mapping call parameters to a slot key string.
///
/// Must be pure: parameters that are equal in the caller's sense must map to
/// equal strings.
pub type Memoizer<P> = Arc<dyn Fn(&P) -> String + Send + Sync>;

/// Derives slot keys for one slice.
pub struct SlotResolver<P> {
    memoizer: Option<Memoizer<P>>,
}

impl<P> SlotResolver<P> {
    /// Resolver for `memoizer`; `None` means single-slot mode
    #[must_use]
    pub fn new(memoizer: Option<Memoizer<P>>) -> Self {
        Self { memoizer }
    }

    /// Addressing mode implied by the memoizer's presence
    #[must_use]
    pub const fn mode(&self) -> SlotMode {
        if self.memoizer.is_some() {
            SlotMode::Keyed
        } else {
            SlotMode::Single
        }
    }

    /// Slot key for `params`, or `None` in single-slot mode
    pub fn derive(&self, params: &P) -> Option<SlotKey> {
        self.memoizer
            .as_ref()
            .map(|memoize| SlotKey::new(memoize(params)))
    }
}

impl<P> Clone for SlotResolver<P> {
    fn clone(&self) -> Self {
        Self {
            memoizer: self.memoizer.clone(),
        }
    }
}

impl<P> fmt::Debug for SlotResolver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotResolver")
            .field("mode", &self.mode())
            .finish()
    }
}

/// A single field write applied by [`merge_fields_at_slot`].
///
/// `None` writes the absent value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate<T, D, E> {
    /// `fetching` flag
    Fetching(bool),
    /// Formatted data
    Data(Option<D>),
    /// Raw data as returned by the fetch function
    RawData(Option<T>),
    /// Formatted error
    Error(Option<E>),
}

/// Apply `updates` to a copy of `prev` at `slot`.
///
/// With a slot key each field becomes `{..existing, [slot]: value}`, without
/// one the field is replaced wholesale. Writes whose addressing disagrees
/// with the slice's mode are dropped; callers check the mode first.
#[must_use]
pub fn merge_fields_at_slot<T, D, E>(
    prev: &SliceState<T, D, E>,
    slot: Option<&SlotKey>,
    updates: impl IntoIterator<Item = FieldUpdate<T, D, E>>,
) -> SliceState<T, D, E>
where
    T: Clone,
    D: Clone,
    E: Clone,
{
    updates.into_iter().fold(prev.clone(), |mut next, update| {
        match update {
            FieldUpdate::Fetching(value) => next.fetching.put(slot, Some(value)),
            FieldUpdate::Data(value) => next.data.put(slot, value),
            FieldUpdate::RawData(value) => next.raw_data.put(slot, value),
            FieldUpdate::Error(value) => next.error.put(slot, value),
        }
        next
    })
}
