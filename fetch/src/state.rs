//! State shapes: the application state tree and the per-slice fetch state.

use crate::constants::{COMMON_STORE_KEY, StoreKey};
use crate::slot::SlotKey;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a slice addresses its fields. Fixed for the slice's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// One implicit slot; every parameter set shares it
    Single,
    /// One slot per memoized parameter set
    Keyed,
}

/// A slice field in one of the two addressing modes.
#[derive(Debug, Clone, PartialEq)]
pub enum Slotted<V> {
    /// Single-slot mode: the value itself
    Unkeyed(Option<V>),
    /// Keyed mode: value per slot key
    Keyed(HashMap<SlotKey, V>),
}

impl<V> Slotted<V> {
    /// An empty field in `mode`
    #[must_use]
    pub fn empty(mode: SlotMode) -> Self {
        match mode {
            SlotMode::Single => Self::Unkeyed(None),
            SlotMode::Keyed => Self::Keyed(HashMap::new()),
        }
    }

    /// The field's addressing mode
    #[must_use]
    pub const fn mode(&self) -> SlotMode {
        match self {
            Self::Unkeyed(_) => SlotMode::Single,
            Self::Keyed(_) => SlotMode::Keyed,
        }
    }

    /// Value at `slot`; a slot key against an unkeyed field (or the other
    /// way round) reads nothing.
    #[must_use]
    pub fn get(&self, slot: Option<&SlotKey>) -> Option<&V> {
        match (self, slot) {
            (Self::Unkeyed(value), None) => value.as_ref(),
            (Self::Keyed(values), Some(slot)) => values.get(slot),
            _ => None,
        }
    }

    /// Every populated slot, for keyed fields
    #[must_use]
    pub const fn keyed(&self) -> Option<&HashMap<SlotKey, V>> {
        match self {
            Self::Keyed(values) => Some(values),
            Self::Unkeyed(_) => None,
        }
    }

    pub(crate) fn put(&mut self, slot: Option<&SlotKey>, value: Option<V>) {
        match (self, slot) {
            (Self::Unkeyed(current), None) => *current = value,
            (Self::Keyed(values), Some(slot)) => match value {
                Some(value) => {
                    values.insert(slot.clone(), value);
                },
                None => {
                    values.remove(slot);
                },
            },
            _ => {},
        }
    }
}

/// Fetch state of one slice.
///
/// - `T`: raw response as returned by the fetch function
/// - `D`: formatted response
/// - `E`: formatted error
///
/// All four fields share the addressing mode given to [`SliceState::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct SliceState<T, D, E> {
    pub(crate) fetching: Slotted<bool>,
    pub(crate) data: Slotted<D>,
    pub(crate) raw_data: Slotted<T>,
    pub(crate) error: Slotted<E>,
}

impl<T, D, E> SliceState<T, D, E> {
    /// Empty slice state in `mode`
    #[must_use]
    pub fn new(mode: SlotMode) -> Self {
        Self {
            fetching: Slotted::empty(mode),
            data: Slotted::empty(mode),
            raw_data: Slotted::empty(mode),
            error: Slotted::empty(mode),
        }
    }

    /// Addressing mode of every field
    #[must_use]
    pub const fn mode(&self) -> SlotMode {
        self.fetching.mode()
    }

    /// Whether a request is in progress
    #[must_use]
    pub const fn fetching(&self) -> &Slotted<bool> {
        &self.fetching
    }

    /// Formatted response data
    #[must_use]
    pub const fn data(&self) -> &Slotted<D> {
        &self.data
    }

    /// Response data as received
    #[must_use]
    pub const fn raw_data(&self) -> &Slotted<T> {
        &self.raw_data
    }

    /// Formatted error of the last failed request
    #[must_use]
    pub const fn error(&self) -> &Slotted<E> {
        &self.error
    }
}

type SliceNode = Arc<dyn Any + Send + Sync>;

/// The `api` namespace: store key → slice state.
///
/// Slices are type-erased and reference counted. Cloning the namespace is a
/// shallow copy; a write replaces exactly one slice and leaves the others
/// pointer-identical.
#[derive(Clone, Default)]
pub struct ApiNamespace {
    slices: HashMap<StoreKey, SliceNode>,
}

impl ApiNamespace {
    /// Number of slices present
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Returns `true` if no slice has been written yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Returns `true` if a slice exists under `store_key`
    #[must_use]
    pub fn contains(&self, store_key: &str) -> bool {
        self.slices.contains_key(store_key)
    }

    /// Typed view of the slice under `store_key`
    ///
    /// `None` if the slice is missing or holds a different state type.
    #[must_use]
    pub fn slice<S: Any>(&self, store_key: &str) -> Option<&S> {
        self.slices.get(store_key)?.downcast_ref()
    }

    /// The shared node behind `store_key`, for identity comparisons
    #[must_use]
    pub fn node(&self, store_key: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.slices.get(store_key)
    }

    /// Store keys of all slices
    pub fn store_keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(|key| &**key)
    }

    pub(crate) fn replace<S>(&mut self, store_key: StoreKey, slice: S)
    where
        S: Any + Send + Sync,
    {
        self.slices.insert(store_key, Arc::new(slice));
    }
}

impl fmt::Debug for ApiNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.store_keys().collect();
        keys.sort_unstable();
        f.debug_struct("ApiNamespace").field("slices", &keys).finish()
    }
}

/// Application state tree.
///
/// Starts as `{ api: {} }`; every fetch slice lives at `api.<store key>`.
#[derive(Debug, Clone, Default)]
pub struct StateTree {
    api: ApiNamespace,
}

impl StateTree {
    /// The initial tree with an empty `api` namespace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `api` namespace
    #[must_use]
    pub const fn api(&self) -> &ApiNamespace {
        &self.api
    }

    pub(crate) fn api_mut(&mut self) -> &mut ApiNamespace {
        &mut self.api
    }

    /// Typed slice lookup by dotted path (`"api.<store key>"`)
    ///
    /// Tolerant: a malformed path, a missing slice or a type mismatch yields `None`.
    #[must_use]
    pub fn slice_at<S: Any>(&self, path: &str) -> Option<&S> {
        let (namespace, store_key) = path.split_once('.')?;
        if namespace != COMMON_STORE_KEY {
            return None;
        }
        self.api.slice(store_key)
    }
}

impl AsRef<StateTree> for StateTree {
    fn as_ref(&self) -> &StateTree {
        self
    }
}
