//! Actions understood by a fetch slice's reducer.

use crate::constants::StoreKey;
use crate::slot::SlotKey;

/// Events of one fetch slice.
///
/// Every variant except [`ApiAction::Other`] names the slice it targets and
/// carries the slot key derived when the action was created.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiAction<T, D, E> {
    /// Set the fetching flag
    SetFetching {
        /// Target slice
        store_key: StoreKey,
        /// Target slot
        slot: Option<SlotKey>,
        /// New flag value
        is_fetching: bool,
    },
    /// Store a response, formatted and raw
    SetResponse {
        /// Target slice
        store_key: StoreKey,
        /// Target slot
        slot: Option<SlotKey>,
        /// Formatted payload
        data: D,
        /// Payload as returned by the fetch function
        raw_data: T,
    },
    /// Store a formatted error
    SetError {
        /// Target slice
        store_key: StoreKey,
        /// Target slot
        slot: Option<SlotKey>,
        /// Formatted error payload
        error: E,
    },
    /// Remove the stored error
    ClearError {
        /// Target slice
        store_key: StoreKey,
        /// Target slot
        slot: Option<SlotKey>,
    },
    /// Remove the stored formatted data
    ClearResponse {
        /// Target slice
        store_key: StoreKey,
        /// Target slot
        slot: Option<SlotKey>,
    },
    /// Any action the slice does not handle
    Other {
        /// Tag of the foreign action
        action_type: String,
    },
}

impl<T, D, E> ApiAction<T, D, E> {
    /// Shorthand for an [`ApiAction::Other`] with the given tag
    #[must_use]
    pub fn other(action_type: impl Into<String>) -> Self {
        Self::Other {
            action_type: action_type.into(),
        }
    }

    /// Slice this action targets, `None` for [`ApiAction::Other`]
    #[must_use]
    pub fn store_key(&self) -> Option<&StoreKey> {
        match self {
            Self::SetFetching { store_key, .. }
            | Self::SetResponse { store_key, .. }
            | Self::SetError { store_key, .. }
            | Self::ClearError { store_key, .. }
            | Self::ClearResponse { store_key, .. } => Some(store_key),
            Self::Other { .. } => None,
        }
    }

    /// Slot this action targets
    #[must_use]
    pub fn slot(&self) -> Option<&SlotKey> {
        match self {
            Self::SetFetching { slot, .. }
            | Self::SetResponse { slot, .. }
            | Self::SetError { slot, .. }
            | Self::ClearError { slot, .. }
            | Self::ClearResponse { slot, .. } => slot.as_ref(),
            Self::Other { .. } => None,
        }
    }

    /// The action's tag, e.g. `API/FETCHING/faq`
    #[must_use]
    pub fn action_type(&self) -> String {
        let (event, store_key) = match self {
            Self::SetFetching { store_key, .. } => ("FETCHING", store_key),
            Self::SetResponse { store_key, .. } => ("RESPONSE", store_key),
            Self::SetError { store_key, .. } => ("ERROR", store_key),
            Self::ClearError { store_key, .. } => ("CLEAR_ERROR", store_key),
            Self::ClearResponse { store_key, .. } => ("CLEAR_RESPONSE", store_key),
            Self::Other { action_type } => return action_type.clone(),
        };
        format!("API/{event}/{store_key}")
    }
}
