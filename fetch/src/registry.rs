//! Composition root collecting every slice reducer of an application.

use composable_fetch_core::composition::{BoxedReducer, CombinedReducer, combine_reducers, reduce_all};
use composable_fetch_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::fmt;

/// Named reducers over one root state and action type.
///
/// Each slice registers its reducer (lifted with
/// [`pullback`](composable_fetch_core::composition::pullback) when the root
/// action type wraps [`ApiAction`](crate::ApiAction)). Registering twice under
/// one name replaces the earlier reducer in place, keeping its position.
///
/// The registry is itself a [`Reducer`] running every entry in registration
/// order, or can be turned into a [`CombinedReducer`] with [`Self::build`].
pub struct ReducerRegistry<S, A, E = ()> {
    names: Vec<String>,
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> ReducerRegistry<S, A, E> {
    /// An empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            names: Vec::new(),
            reducers: Vec::new(),
        }
    }

    /// Register `reducer` under `name`
    pub fn register<R>(&mut self, name: impl Into<String>, reducer: R) -> &mut Self
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    {
        let name = name.into();
        let reducer: BoxedReducer<S, A, E> = Box::new(reducer);

        if let Some(index) = self.names.iter().position(|existing| *existing == name) {
            tracing::warn!(%name, "Replacing previously registered reducer");
            self.reducers[index] = reducer;
        } else {
            tracing::debug!(%name, "Registered reducer");
            self.names.push(name);
            self.reducers.push(reducer);
        }
        self
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns `true` if a reducer is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    /// Number of registered reducers
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns `true` if nothing was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }

    /// Drop the names and combine the reducers
    #[must_use]
    pub fn build(self) -> CombinedReducer<S, A, E>
    where
        A: Clone,
    {
        combine_reducers(self.reducers)
    }
}

impl<S, A, E> Default for ReducerRegistry<S, A, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, E> fmt::Debug for ReducerRegistry<S, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<S, A, E> Reducer for ReducerRegistry<S, A, E>
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
