//! Synchronous action creators of one slice.

use crate::action::ApiAction;
use crate::constants::StoreKey;
use crate::slot::{SlotKey, SlotResolver};
use std::fmt;
use std::sync::Arc;

/// Maps a raw response to the formatted data stored under `data`.
pub type DataFormatter<T, D> = Arc<dyn Fn(&T) -> D + Send + Sync>;

/// Maps a fetch error to the payload stored under `error`.
pub type ErrorPayload<Err, E> = Arc<dyn Fn(&Err) -> E + Send + Sync>;

/// Builds [`ApiAction`]s for one slice.
///
/// Every creator takes the call parameters and embeds the slot key derived
/// from them, so actions built for equal parameters always hit the same slot.
pub struct ActionCreators<P, T, Err, D, E> {
    store_key: StoreKey,
    slots: SlotResolver<P>,
    data_formatter: DataFormatter<T, D>,
    error_payload: ErrorPayload<Err, E>,
}

impl<P, T, Err, D, E> ActionCreators<P, T, Err, D, E> {
    /// Creators for `store_key`
    #[must_use]
    pub fn new(
        store_key: StoreKey,
        slots: SlotResolver<P>,
        data_formatter: DataFormatter<T, D>,
        error_payload: ErrorPayload<Err, E>,
    ) -> Self {
        Self {
            store_key,
            slots,
            data_formatter,
            error_payload,
        }
    }

    /// Slot key for `params`
    #[must_use]
    pub fn slot_key(&self, params: &P) -> Option<SlotKey> {
        self.slots.derive(params)
    }

    /// `API/FETCHING` with the given flag
    #[must_use]
    pub fn set_fetching(&self, is_fetching: bool, params: &P) -> ApiAction<T, D, E> {
        ApiAction::SetFetching {
            store_key: self.store_key.clone(),
            slot: self.slot_key(params),
            is_fetching,
        }
    }

    /// `API/CLEAR_ERROR`
    #[must_use]
    pub fn clear_error(&self, params: &P) -> ApiAction<T, D, E> {
        ApiAction::ClearError {
            store_key: self.store_key.clone(),
            slot: self.slot_key(params),
        }
    }

    /// `API/RESPONSE`: formats `raw_data` and carries both forms
    #[must_use]
    pub fn set_data(&self, raw_data: T, params: &P) -> ApiAction<T, D, E> {
        ApiAction::SetResponse {
            store_key: self.store_key.clone(),
            slot: self.slot_key(params),
            data: (self.data_formatter)(&raw_data),
            raw_data,
        }
    }

    /// `API/ERROR` with the formatted error
    #[must_use]
    pub fn set_error(&self, error: &Err, params: &P) -> ApiAction<T, D, E> {
        ApiAction::SetError {
            store_key: self.store_key.clone(),
            slot: self.slot_key(params),
            error: (self.error_payload)(error),
        }
    }

    /// `API/CLEAR_RESPONSE`
    #[must_use]
    pub fn clear_data(&self, params: &P) -> ApiAction<T, D, E> {
        ApiAction::ClearResponse {
            store_key: self.store_key.clone(),
            slot: self.slot_key(params),
        }
    }
}

impl<P, T, Err, D, E> Clone for ActionCreators<P, T, Err, D, E> {
    fn clone(&self) -> Self {
        Self {
            store_key: self.store_key.clone(),
            slots: self.slots.clone(),
            data_formatter: Arc::clone(&self.data_formatter),
            error_payload: Arc::clone(&self.error_payload),
        }
    }
}

impl<P, T, Err, D, E> fmt::Debug for ActionCreators<P, T, Err, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreators")
            .field("store_key", &self.store_key)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}
