//! # Composable Fetch Runtime
//!
//! Runtime implementation for the Composable Fetch architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling, and the [`Dispatcher`] seam that thunk-style action
//! creators are written against.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Dispatcher**: Dispatch + read-state abstraction implemented by the Store
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//!
//! ## Example
//!
//! ```ignore
//! use composable_fetch_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use composable_fetch_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

mod dispatch;

pub use dispatch::Dispatcher;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// A spawned effect task failed to join
        ///
        /// This typically means a spawned task panicked.
        #[error("Effect task failed: {0}")]
        TaskJoinError(#[from] tokio::task::JoinError),
    }
}

pub use error::StoreError;

/// Store configuration
///
/// # Example
///
/// ```
/// use composable_fetch_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_broadcast_capacity(256);
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for each `subscribe_actions` receiver
    pub broadcast_capacity: usize,
    /// Interval at which `shutdown` polls for outstanding effects
    pub shutdown_poll_interval: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the shutdown poll interval
    #[must_use]
    pub const fn with_shutdown_poll_interval(mut self, interval: Duration) -> Self {
        self.shutdown_poll_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            shutdown_poll_interval: Duration::from_millis(10),
        }
    }
}

/// Decrements the pending effect counter when an effect task ends,
/// including when it panics.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - the runtime coordinator
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, Dispatcher, Duration, Effect, Ordering, PendingGuard,
        Reducer, RwLock, StoreConfig, StoreError,
    };
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::future::Future;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (state transitions)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a store is cheap; clones share state, reducer and effects.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        poll_interval: Duration,
        /// Every action applied by the store, in application order.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                poll_interval: config.shutdown_poll_interval,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the state write lock
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Broadcasts the action to subscribers
        /// 4. Starts the returned effects (they may feed actions back)
        ///
        /// `send()` returns once the reducer ran; effects complete later.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let start = std::time::Instant::now();
                let effects = self
                    .reducer
                    .reduce(&mut *state, action.clone(), &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                // Broadcast while still holding the lock so subscribers see
                // actions in the order they were applied.
                let _ = self.action_broadcast.send(action);
                effects
            };

            tracing::trace!("Reducer completed, returned {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect);
            }

            Ok(())
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loading = store.state(|s| s.loading).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to every action the store applies
        ///
        /// Only actions sent after subscribing are received.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Number of effect tasks still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running if they did not finish within `timeout`.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let drained = tokio::time::timeout(timeout, async {
                while self.pending_effects.load(Ordering::SeqCst) > 0 {
                    tokio::time::sleep(self.poll_interval).await;
                }
            })
            .await;

            match drained {
                Ok(()) => {
                    tracing::info!("All effects completed, shutdown successful");
                    Ok(())
                },
                Err(_) => {
                    let remaining = self.pending_effects.load(Ordering::SeqCst);
                    tracing::error!(remaining, "Shutdown timed out with effects still running");
                    Err(StoreError::ShutdownTimeout(remaining))
                },
            }
        }

        fn execute_effect(&self, effect: Effect<A>) {
            if effect.is_none() {
                tracing::trace!("Executing Effect::None (no-op)");
                return;
            }

            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = PendingGuard(Arc::clone(&self.pending_effects));
            let store = self.clone();

            tokio::spawn(async move {
                let _guard = guard;
                store.run_effect(effect).await;
            });
        }

        fn run_effect(self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            async move {
                if let Effect::Future(fut) = effect {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    if let Some(action) = fut.await {
                        tracing::trace!("Effect::Future produced an action, sending to store");
                        self.feed_back(action).await;
                    }
                }
            }
            .boxed()
        }

        async fn feed_back(&self, action: A) {
            if let Err(error) = self.send(action).await {
                tracing::warn!(%error, "Dropped action produced by effect");
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                poll_interval: self.poll_interval,
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Dispatcher<S, A> for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Sync + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        fn dispatch(&self, action: A) -> impl Future<Output = Result<(), StoreError>> + Send {
            self.send(action)
        }

        fn select<T, F>(&self, f: F) -> impl Future<Output = T> + Send
        where
            F: FnOnce(&S) -> T + Send,
            T: Send,
        {
            self.state(f)
        }
    }
}

// Re-export for convenience
pub use store::Store;
