//! # Composable Fetch Testing
//!
//! Testing utilities and helpers for the Composable Fetch architecture.
//!
//! This crate provides:
//! - [`MockApiCall`]: a scripted fetch function that counts its calls and
//!   can hold every call until the test opens a gate
//! - [`RecordingDispatcher`]: a [`Dispatcher`] double recording every action
//! - [`replay`]: fold a list of actions through a reducer
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use composable_fetch_testing::{MockApiCall, RecordingDispatcher};
//!
//! #[tokio::test]
//! async fn test_fetch_once() {
//!     let api = MockApiCall::resolving(vec![1, 2, 3]);
//!     let fetch = api.clone();
//!     let slice = ApiSlice::new(ApiSliceConfig::new("faq", move |p: ()| fetch.call(p)));
//!     let dispatcher = RecordingDispatcher::live(StateTree::new(), slice.reducer(), ());
//!
//!     slice.api_call(&dispatcher, ()).await?;
//!     assert_eq!(api.calls(), 1);
//! }
//! ```

use composable_fetch_core::reducer::Reducer;
use composable_fetch_runtime::{Dispatcher, StoreError};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock implementations for testing.
pub mod mocks {
    use super::{Arc, AtomicUsize, Mutex, Ordering, lock};
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::fmt;
    use tokio::sync::watch;

    /// Scripted fetch function
    ///
    /// Resolves every call with the configured outcome. Clones share the
    /// outcome, the call log and the gate, so a test keeps one clone and moves
    /// another into the fetch function.
    ///
    /// # Example
    ///
    /// ```
    /// use composable_fetch_testing::MockApiCall;
    ///
    /// # tokio_test::block_on(async {
    /// let api = MockApiCall::<u8, String>::resolving(7);
    /// assert_eq!(api.call("params").await, Ok(7));
    /// assert_eq!(api.calls(), 1);
    /// assert_eq!(api.received(), vec!["\"params\"".to_string()]);
    /// # });
    /// ```
    pub struct MockApiCall<T, Err> {
        outcome: Arc<Mutex<Result<T, Err>>>,
        received: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
        gate: Arc<watch::Sender<bool>>,
    }

    impl<T, Err> MockApiCall<T, Err>
    where
        T: Clone + Send + 'static,
        Err: Clone + Send + 'static,
    {
        /// Every call succeeds with `value`
        #[must_use]
        pub fn resolving(value: T) -> Self {
            Self::with_outcome(Ok(value))
        }

        /// Every call fails with `error`
        #[must_use]
        pub fn rejecting(error: Err) -> Self {
            Self::with_outcome(Err(error))
        }

        fn with_outcome(outcome: Result<T, Err>) -> Self {
            let (gate, _) = watch::channel(true);
            Self {
                outcome: Arc::new(Mutex::new(outcome)),
                received: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(AtomicUsize::new(0)),
                gate: Arc::new(gate),
            }
        }

        /// Hold every call until [`Self::open`]
        #[must_use]
        pub fn gated(self) -> Self {
            self.gate.send_replace(false);
            self
        }

        /// Release held calls and stop holding new ones
        pub fn open(&self) {
            self.gate.send_replace(true);
        }

        /// Change the outcome of calls that have not resolved yet
        pub fn set_outcome(&self, outcome: Result<T, Err>) {
            *lock(&self.outcome) = outcome;
        }

        /// Number of calls so far
        #[must_use]
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Debug rendering of the parameters of every call, in call order
        #[must_use]
        pub fn received(&self) -> Vec<String> {
            lock(&self.received).clone()
        }

        /// Invoke the mock
        ///
        /// The call is counted immediately; the outcome is read once the gate
        /// is open.
        pub fn call<P: fmt::Debug>(&self, params: P) -> BoxFuture<'static, Result<T, Err>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.received).push(format!("{params:?}"));

            let mut gate = self.gate.subscribe();
            let outcome = Arc::clone(&self.outcome);
            async move {
                // A dropped sender leaves the gate as it was last set.
                let _ = gate.wait_for(|open| *open).await;
                lock(&outcome).clone()
            }
            .boxed()
        }
    }

    impl<T, Err> Clone for MockApiCall<T, Err> {
        fn clone(&self) -> Self {
            Self {
                outcome: Arc::clone(&self.outcome),
                received: Arc::clone(&self.received),
                calls: Arc::clone(&self.calls),
                gate: Arc::clone(&self.gate),
            }
        }
    }

    impl<T, Err> fmt::Debug for MockApiCall<T, Err> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockApiCall")
                .field("calls", &self.calls.load(Ordering::SeqCst))
                .field("open", &*self.gate.borrow())
                .finish_non_exhaustive()
        }
    }
}

type Apply<S, A> = Arc<dyn Fn(&mut S, A) + Send + Sync>;

/// [`Dispatcher`] double that records every dispatched action.
///
/// A *live* dispatcher also folds actions into its state through a reducer
/// (effects are dropped); a *detached* one leaves state as given, which pins
/// what `select` observes.
pub struct RecordingDispatcher<S, A> {
    state: Arc<Mutex<S>>,
    apply: Option<Apply<S, A>>,
    actions: Arc<Mutex<Vec<A>>>,
    rejecting: Arc<AtomicBool>,
    dispatched: Arc<AtomicUsize>,
}

impl<S, A> RecordingDispatcher<S, A>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
{
    /// Record actions without applying them
    #[must_use]
    pub fn detached(state: S) -> Self {
        Self::build(state, None)
    }

    /// Record actions and apply them with `reducer`
    #[must_use]
    pub fn live<R>(state: S, reducer: R, environment: R::Environment) -> Self
    where
        R: Reducer<State = S, Action = A> + Send + Sync + 'static,
        R::Environment: Send + Sync + 'static,
    {
        let apply: Apply<S, A> = Arc::new(move |state: &mut S, action: A| {
            let _ = reducer.reduce(state, action, &environment);
        });
        Self::build(state, Some(apply))
    }

    fn build(state: S, apply: Option<Apply<S, A>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            apply,
            actions: Arc::new(Mutex::new(Vec::new())),
            rejecting: Arc::new(AtomicBool::new(false)),
            dispatched: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every later dispatch with [`StoreError::ShutdownInProgress`]
    pub fn reject_dispatches(&self) {
        self.rejecting.store(true, Ordering::SeqCst);
    }

    /// Every accepted action, in dispatch order
    #[must_use]
    pub fn actions(&self) -> Vec<A> {
        lock(&self.actions).clone()
    }

    /// Number of dispatch attempts, rejected ones included
    #[must_use]
    pub fn dispatch_attempts(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Forget recorded actions
    pub fn clear_actions(&self) {
        lock(&self.actions).clear();
    }

    /// Copy of the current state
    #[must_use]
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        lock(&self.state).clone()
    }

    fn record(&self, action: A) -> Result<(), StoreError> {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(StoreError::ShutdownInProgress);
        }

        let mut state = lock(&self.state);
        if let Some(apply) = &self.apply {
            apply(&mut *state, action.clone());
        }
        lock(&self.actions).push(action);
        Ok(())
    }
}

impl<S, A> Clone for RecordingDispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            apply: self.apply.clone(),
            actions: Arc::clone(&self.actions),
            rejecting: Arc::clone(&self.rejecting),
            dispatched: Arc::clone(&self.dispatched),
        }
    }
}

impl<S, A> Dispatcher<S, A> for RecordingDispatcher<S, A>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
{
    fn dispatch(&self, action: A) -> impl Future<Output = Result<(), StoreError>> + Send {
        let dispatcher = self.clone();
        async move { dispatcher.record(action) }
    }

    fn select<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&S) -> T + Send,
        T: Send,
    {
        let state = Arc::clone(&self.state);
        async move { f(&lock(&state)) }
    }
}

/// Apply `actions` to `initial` in order and return the final state.
///
/// Effects are discarded.
pub fn replay<R>(
    reducer: &R,
    environment: &R::Environment,
    initial: R::State,
    actions: impl IntoIterator<Item = R::Action>,
) -> R::State
where
    R: Reducer,
{
    actions.into_iter().fold(initial, |mut state, action| {
        let _ = reducer.reduce(&mut state, action, environment);
        state
    })
}

/// Install a test-friendly `tracing` subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub use mocks::MockApiCall;
