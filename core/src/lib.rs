//! # Composable Fetch Core
//!
//! Core traits and types for the Composable Fetch architecture.
//!
//! This crate provides the fundamental abstractions every fetch slice is
//! built from: a pure [`Reducer`](reducer::Reducer) that folds actions into
//! state, and [`Effect`](effect::Effect) descriptions that the runtime
//! executes on the reducer's behalf.
//!
//! ## Core Concepts
//!
//! - **State**: Application state tree owned by a store
//! - **Action**: All possible inputs to a reducer
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies
//!
//! ## Example
//!
//! ```
//! use composable_fetch_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct LoadingState {
//!     loading: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum LoadingAction {
//!     Started,
//!     Finished,
//! }
//!
//! struct LoadingReducer;
//!
//! impl Reducer for LoadingReducer {
//!     type State = LoadingState;
//!     type Action = LoadingAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut LoadingState,
//!         action: LoadingAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<LoadingAction>; 4]> {
//!         state.loading = matches!(action, LoadingAction::Started);
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = LoadingState::default();
//! let _ = LoadingReducer.reduce(&mut state, LoadingAction::Started, &());
//! assert!(state.loading);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all state transition logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Inspects the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// An action the reducer does not handle must leave `state` untouched.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }

    impl<R> Reducer for Box<R>
    where
        R: Reducer + ?Sized,
    {
        type State = R::State;
        type Action = R::Action;
        type Environment = R::Environment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            (**self).reduce(state, action, env)
        }
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution).
pub mod effect {
    use futures::FutureExt;
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Transform the actions this effect produces
        ///
        /// Used when embedding a child reducer into a parent whose action type
        /// wraps the child's (see [`pullback`](crate::composition::pullback)).
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            Action: Send + 'static,
            B: 'static,
            F: FnOnce(Action) -> B + Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Future(fut) => Effect::Future(Box::pin(fut.map(move |a| a.map(f)))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn test_map_keeps_none() {
        let effect: Effect<u8> = Effect::None;
        assert!(effect.map(u16::from).is_none());
    }

    #[tokio::test]
    async fn test_map_future_output() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { Some(7) }));
        let Effect::Future(fut) = effect.map(|n| format!("#{n}")) else {
            unreachable!("future stays a future");
        };
        assert_eq!(fut.await.as_deref(), Some("#7"));
    }
}
