//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`pullback`**: Embed a reducer whose actions are a case of a larger action type
//!
//! # Example
//!
//! ```
//! use composable_fetch_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use composable_fetch_core::composition::pullback;
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Ticks(u32),
//!     Other,
//! }
//!
//! struct TickReducer;
//!
//! impl Reducer for TickReducer {
//!     type State = u32;
//!     type Action = u32;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut u32, action: u32, _env: &()) -> SmallVec<[Effect<u32>; 4]> {
//!         *state += action;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let app = pullback(
//!     TickReducer,
//!     |action: AppAction| match action {
//!         AppAction::Ticks(n) => Some(n),
//!         AppAction::Other => None,
//!     },
//!     AppAction::Ticks,
//! );
//!
//! let mut state = 0;
//! let _ = app.reduce(&mut state, AppAction::Ticks(3), &());
//! let _ = app.reduce(&mut state, AppAction::Other, &());
//! assert_eq!(state, 3);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A type-erased reducer, as held by [`CombinedReducer`].
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// Run `reducers` in order on one action.
///
/// `Effect::None`s are dropped; if nothing else remains a single
/// `Effect::None` is returned.
pub fn reduce_all<S, A, E>(
    reducers: &[BoxedReducer<S, A, E>],
    state: &mut S,
    action: A,
    env: &E,
) -> SmallVec<[Effect<A>; 4]>
where
    A: Clone,
{
    let mut all_effects = SmallVec::new();

    for reducer in reducers {
        let effects = reducer.reduce(state, action.clone(), env);
        all_effects.extend(effects.into_iter().filter(|e| !e.is_none()));
    }

    if all_effects.is_empty() {
        all_effects.push(Effect::None);
    }
    all_effects
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E> {
    /// Number of reducers in the combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns `true` if no reducer was combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        reduce_all(&self.reducers, state, action, env)
    }
}

/// Embeds a reducer into a larger action type.
///
/// Actions for which `to_local` returns `None` are not the child's business:
/// state is left untouched and a single `Effect::None` is returned. Effects
/// produced by the child are mapped back with `to_global`.
pub fn pullback<A, R>(
    reducer: R,
    to_local: fn(A) -> Option<R::Action>,
    to_global: fn(R::Action) -> A,
) -> PulledBackReducer<A, R>
where
    R: Reducer,
{
    PulledBackReducer {
        reducer,
        to_local,
        to_global,
    }
}

/// A reducer lifted into a larger action type.
///
/// Created by [`pullback`].
pub struct PulledBackReducer<A, R>
where
    R: Reducer,
{
    reducer: R,
    to_local: fn(A) -> Option<R::Action>,
    to_global: fn(R::Action) -> A,
}

impl<A, R> Reducer for PulledBackReducer<A, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: 'static,
{
    type State = R::State;
    type Action = A;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(local) = (self.to_local)(action) else {
            return smallvec::smallvec![Effect::None];
        };

        self.reducer
            .reduce(state, local, env)
            .into_iter()
            .map(|effect| effect.map(self.to_global))
            .collect()
    }
}
