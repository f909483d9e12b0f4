//! The slice reducer.

use crate::action::ApiAction;
use crate::constants::ActionTypes;
use crate::slot::{FieldUpdate, SlotKey, merge_fields_at_slot};
use crate::state::{SliceState, SlotMode, StateTree};
use composable_fetch_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::fmt;
use std::marker::PhantomData;

/// Reducer of one fetch slice.
///
/// Only touches `api.<store key>`; every other part of the tree, including
/// sibling slices, keeps its identity. Actions for other slices and
/// [`ApiAction::Other`] leave the tree untouched.
pub struct ApiReducer<T, D, E> {
    types: ActionTypes,
    mode: SlotMode,
    _payload: PhantomData<fn() -> (T, D, E)>,
}

impl<T, D, E> ApiReducer<T, D, E> {
    /// Reducer for the slice described by `types`, addressed in `mode`
    #[must_use]
    pub const fn new(types: ActionTypes, mode: SlotMode) -> Self {
        Self {
            types,
            mode,
            _payload: PhantomData,
        }
    }

    /// Addressing mode of the slice
    #[must_use]
    pub const fn mode(&self) -> SlotMode {
        self.mode
    }

    fn transition(
        &self,
        action: ApiAction<T, D, E>,
    ) -> Option<(Option<SlotKey>, SmallVec<[FieldUpdate<T, D, E>; 2]>)> {
        if action.store_key() != Some(self.types.store_key()) {
            return None;
        }

        let transition = match action {
            ApiAction::SetFetching {
                slot, is_fetching, ..
            } => (slot, smallvec![FieldUpdate::Fetching(is_fetching)]),
            ApiAction::SetResponse {
                slot,
                data,
                raw_data,
                ..
            } => (
                slot,
                smallvec![
                    FieldUpdate::Data(Some(data)),
                    FieldUpdate::RawData(Some(raw_data)),
                ],
            ),
            ApiAction::SetError { slot, error, .. } => {
                (slot, smallvec![FieldUpdate::Error(Some(error))])
            },
            ApiAction::ClearError { slot, .. } => (slot, smallvec![FieldUpdate::Error(None)]),
            ApiAction::ClearResponse { slot, .. } => (slot, smallvec![FieldUpdate::Data(None)]),
            ApiAction::Other { .. } => return None,
        };
        Some(transition)
    }
}

impl<T, D, E> Clone for ApiReducer<T, D, E> {
    fn clone(&self) -> Self {
        Self::new(self.types.clone(), self.mode)
    }
}

impl<T, D, E> fmt::Debug for ApiReducer<T, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiReducer")
            .field("store_key", self.types.store_key())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<T, D, E> Reducer for ApiReducer<T, D, E>
where
    T: Clone + Send + Sync + 'static,
    D: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type State = StateTree;
    type Action = ApiAction<T, D, E>;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(action_type) = self.types.tag_of(&action) else {
            tracing::trace!(foreign_key = ?action.store_key(), "Ignoring action for another slice");
            return smallvec![Effect::None];
        };
        let Some((slot, updates)) = self.transition(action) else {
            return smallvec![Effect::None];
        };

        let keyed = self.mode == SlotMode::Keyed;
        if slot.is_some() != keyed {
            tracing::warn!(
                store_key = %self.types.store_key(),
                %action_type,
                ?slot,
                mode = ?self.mode,
                "Dropping action whose slot addressing does not match the slice"
            );
            return smallvec![Effect::None];
        }

        let store_key = self.types.store_key();
        let next = match state.api().slice::<SliceState<T, D, E>>(store_key) {
            Some(prev) => merge_fields_at_slot(prev, slot.as_ref(), updates),
            None => {
                if state.api().contains(store_key) {
                    tracing::warn!(
                        %store_key,
                        "Replacing a slice of another state type under the same store key"
                    );
                }
                merge_fields_at_slot(&SliceState::new(self.mode), slot.as_ref(), updates)
            },
        };

        tracing::debug!(%store_key, %action_type, ?slot, "Applied fetch slice transition");
        state.api_mut().replace(store_key.clone(), next);
        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::StoreKey;
    use std::sync::Arc;

    type TestAction = ApiAction<u32, String, bool>;
    type TestReducer = ApiReducer<u32, String, bool>;
    type TestSlice = SliceState<u32, String, bool>;

    fn key() -> StoreKey {
        Arc::from("test")
    }

    fn single() -> TestReducer {
        ApiReducer::new(ActionTypes::new("test"), SlotMode::Single)
    }

    fn response(data: &str, raw_data: u32) -> TestAction {
        TestAction::SetResponse {
            store_key: key(),
            slot: None,
            data: data.to_string(),
            raw_data,
        }
    }

    #[test]
    fn test_initial_state_is_empty_api_namespace() {
        let mut state = StateTree::default();
        let effects = single().reduce(&mut state, TestAction::other("unknown"), &());
        assert!(state.api().is_empty());
        assert!(matches!(effects.as_slice(), [Effect::None]));
    }

    #[test]
    fn test_set_fetching_coerces_into_slice() {
        let mut state = StateTree::default();
        let _ = single().reduce(
            &mut state,
            TestAction::SetFetching {
                store_key: key(),
                slot: None,
                is_fetching: true,
            },
            &(),
        );

        let slice = state.api().slice::<TestSlice>("test");
        assert_eq!(slice.and_then(|s| s.fetching().get(None).copied()), Some(true));
    }

    #[test]
    fn test_set_response_writes_data_and_raw_data() {
        let mut state = StateTree::default();
        let _ = single().reduce(&mut state, response("formatted", 9), &());

        let Some(slice) = state.api().slice::<TestSlice>("test") else {
            unreachable!("slice was written");
        };
        assert_eq!(slice.data().get(None).map(String::as_str), Some("formatted"));
        assert_eq!(slice.raw_data().get(None), Some(&9));
    }

    #[test]
    fn test_clear_response_keeps_raw_data() {
        let reducer = single();
        let mut state = StateTree::default();
        let _ = reducer.reduce(&mut state, response("formatted", 9), &());
        let _ = reducer.reduce(
            &mut state,
            TestAction::ClearResponse {
                store_key: key(),
                slot: None,
            },
            &(),
        );

        let slice = state.api().slice::<TestSlice>("test");
        assert_eq!(slice.and_then(|s| s.data().get(None)), None);
        assert_eq!(slice.and_then(|s| s.raw_data().get(None)), Some(&9));
    }

    #[test]
    fn test_error_set_and_cleared() {
        let reducer = single();
        let mut state = StateTree::default();
        let _ = reducer.reduce(
            &mut state,
            TestAction::SetError {
                store_key: key(),
                slot: None,
                error: true,
            },
            &(),
        );
        assert_eq!(
            state.api().slice::<TestSlice>("test").and_then(|s| s.error().get(None)),
            Some(&true)
        );

        let _ = reducer.reduce(
            &mut state,
            TestAction::ClearError {
                store_key: key(),
                slot: None,
            },
            &(),
        );
        assert_eq!(
            state.api().slice::<TestSlice>("test").and_then(|s| s.error().get(None)),
            None
        );
    }

    #[test]
    fn test_foreign_store_key_is_identity() {
        let reducer = single();
        let mut state = StateTree::default();
        let _ = reducer.reduce(&mut state, response("mine", 1), &());
        let before = state.api().node("test").cloned();

        let _ = reducer.reduce(
            &mut state,
            TestAction::SetFetching {
                store_key: Arc::from("someone-else"),
                slot: None,
                is_fetching: true,
            },
            &(),
        );

        let after = state.api().node("test").cloned();
        assert!(matches!((before, after), (Some(b), Some(a)) if Arc::ptr_eq(&b, &a)));
        assert!(!state.api().contains("someone-else"));
    }

    #[test]
    fn test_mismatched_addressing_is_dropped() {
        let reducer = single();
        let mut state = StateTree::default();
        let _ = reducer.reduce(
            &mut state,
            TestAction::SetFetching {
                store_key: key(),
                slot: Some(SlotKey::from("stray")),
                is_fetching: true,
            },
            &(),
        );
        assert!(state.api().is_empty());
    }

    #[test]
    fn test_keyed_slots_are_independent() {
        let reducer = TestReducer::new(ActionTypes::new("test"), SlotMode::Keyed);
        let mut state = StateTree::default();
        for (slot, raw) in [("en", 1), ("de", 2)] {
            let _ = reducer.reduce(
                &mut state,
                TestAction::SetResponse {
                    store_key: key(),
                    slot: Some(SlotKey::from(slot)),
                    data: slot.to_uppercase(),
                    raw_data: raw,
                },
                &(),
            );
        }

        let Some(slice) = state.api().slice::<TestSlice>("test") else {
            unreachable!("slice was written");
        };
        assert_eq!(slice.raw_data().get(Some(&SlotKey::from("en"))), Some(&1));
        assert_eq!(slice.raw_data().get(Some(&SlotKey::from("de"))), Some(&2));
        assert_eq!(slice.data().keyed().map(|slots| slots.len()), Some(2));
    }
}
