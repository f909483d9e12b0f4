//! Fetch orchestration: cache check, in-flight dedup and settlement.
//!
//! [`ApiSlice::api_call`] is the only place a fetch function is invoked. Per
//! slot it either starts one fetch, returns cached raw data, or joins the
//! fetch already in flight. The check-and-register step and the settlement
//! dispatches both run under the slice's registry lock, so a slot is never
//! fetched twice concurrently and settlement is never interleaved with a
//! fresh check.

use crate::action::ApiAction;
use crate::error::FetchError;
use crate::factory::{ApiSlice, Payload};
use crate::slot::SlotKey;
use crate::state::StateTree;
use composable_fetch_runtime::Dispatcher;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The user-supplied fetch function, boxed.
///
/// Several call arguments are passed as one tuple, none as `()`.
pub type ApiCallFn<P, T, Err> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<T, Err>> + Send + Sync>;

/// Outcome of one fetch, shared by every caller that joined it.
pub(crate) type PendingFetch<T, Err> = Shared<BoxFuture<'static, Result<T, FetchError<Err>>>>;

/// Registry key (slot key, or `None` in single-slot mode) → fetch in flight.
pub(crate) type InFlight<T, Err> = Mutex<HashMap<Option<SlotKey>, PendingFetch<T, Err>>>;

impl<P, T, Err, D, E> ApiSlice<P, T, Err, D, E>
where
    P: Payload,
    T: Payload,
    Err: Payload + fmt::Debug,
    D: Payload,
    E: Payload,
{
    /// Fetch for `params`, at most once per slot at a time.
    ///
    /// 1. Raw data present: returns it without dispatching anything.
    /// 2. A fetch for the slot is registered: joins it.
    /// 3. Otherwise runs the fetch function, dispatching `set_fetching(true)`
    ///    up front and `set_fetching(false)`, `clear_error`, `set_data` on
    ///    success or `set_fetching(false)`, `set_error` on failure.
    ///
    /// The fetch runs in its own task, so it settles into state even when
    /// every caller drops the returned future.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Api`] with the fetch function's error; the formatted
    ///   error is already in state
    /// - [`FetchError::TaskAborted`] if the fetch task panicked
    /// - [`FetchError::NoPendingRequest`] if the slot reads as fetching but
    ///   this slice started no request for it
    pub async fn api_call<Dp, S, A>(&self, dispatcher: &Dp, params: P) -> Result<T, FetchError<Err>>
    where
        Dp: Dispatcher<S, A>,
        S: AsRef<StateTree> + 'static,
        A: From<ApiAction<T, D, E>> + Send + 'static,
    {
        let slot = self.slot_key(&params);
        let store_key = self.store_key().clone();
        let mut pending = self.in_flight.lock().await;

        let selectors = &self.selectors;
        let (fetching, cached) = dispatcher
            .select(|state: &S| {
                let tree = state.as_ref();
                (
                    selectors.fetching_status(tree, slot.as_ref()).unwrap_or(false),
                    selectors.raw_data(tree, slot.as_ref()),
                )
            })
            .await;

        if let Some(raw_data) = cached {
            tracing::trace!(%store_key, ?slot, "Returning cached response");
            metrics::counter!("api_slice.requests", "store_key" => store_key.to_string(), "outcome" => "cache_hit")
                .increment(1);
            return Ok(raw_data);
        }

        // The registry, not the flag, decides: the start dispatch may never
        // have been applied if its caller was dropped.
        if let Some(outcome) = pending.get(&slot).cloned() {
            drop(pending);
            tracing::debug!(%store_key, ?slot, "Joining fetch in flight");
            metrics::counter!("api_slice.requests", "store_key" => store_key.to_string(), "outcome" => "deduplicated")
                .increment(1);
            return outcome.await;
        }

        if fetching {
            tracing::warn!(%store_key, ?slot, "Slot is fetching but no request is in flight");
            return Err(FetchError::NoPendingRequest {
                store_key: store_key.to_string(),
            });
        }

        tracing::debug!(%store_key, ?slot, "Starting fetch");
        metrics::counter!("api_slice.requests", "store_key" => store_key.to_string(), "outcome" => "fetch")
            .increment(1);

        let outcome = self.spawn_fetch(dispatcher.clone(), params.clone(), slot.clone());
        pending.insert(slot, outcome.clone());
        if let Err(error) = dispatcher
            .dispatch(A::from(self.creators.set_fetching(true, &params)))
            .await
        {
            tracing::warn!(%store_key, %error, "Failed to dispatch fetch start");
        }
        drop(pending);
        outcome.await
    }

    /// Number of fetches currently in flight
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    fn spawn_fetch<Dp, S, A>(&self, dispatcher: Dp, params: P, slot: Option<SlotKey>) -> PendingFetch<T, Err>
    where
        Dp: Dispatcher<S, A>,
        S: 'static,
        A: From<ApiAction<T, D, E>> + Send + 'static,
    {
        let fetch = (self.fetch)(params.clone());
        let creators = self.creators.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let store_key = self.store_key().clone();

        let task = {
            let dispatcher = dispatcher.clone();
            let in_flight = Arc::clone(&in_flight);
            let creators = creators.clone();
            let params = params.clone();
            let slot = slot.clone();
            let store_key = store_key.clone();

            tokio::spawn(async move {
                let result = fetch.await;

                let mut pending = in_flight.lock().await;
                pending.remove(&slot);

                let (actions, outcome) = match result {
                    Ok(raw_data) => {
                        tracing::debug!(%store_key, ?slot, "Fetch succeeded");
                        let actions = vec![
                            creators.set_fetching(false, &params),
                            creators.clear_error(&params),
                            creators.set_data(raw_data.clone(), &params),
                        ];
                        (actions, Ok(raw_data))
                    },
                    Err(error) => {
                        tracing::warn!(%store_key, ?slot, ?error, "Fetch failed");
                        metrics::counter!("api_slice.fetch.failed", "store_key" => store_key.to_string())
                            .increment(1);
                        let actions = vec![
                            creators.set_fetching(false, &params),
                            creators.set_error(&error, &params),
                        ];
                        (actions, Err(FetchError::Api(error)))
                    },
                };

                for action in actions {
                    let action_type = action.action_type();
                    if let Err(error) = dispatcher.dispatch(A::from(action)).await {
                        tracing::warn!(%store_key, %action_type, %error, "Failed to dispatch settlement");
                    }
                }
                drop(pending);
                outcome
            })
        };

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    tracing::error!(%store_key, ?slot, error = %join_error, "Fetch task aborted");
                    in_flight.lock().await.remove(&slot);
                    let action = creators.set_fetching(false, &params);
                    if let Err(error) = dispatcher.dispatch(A::from(action)).await {
                        tracing::warn!(%store_key, %error, "Failed to reset fetching flag");
                    }
                    Err(FetchError::TaskAborted(join_error.to_string()))
                },
            }
        }
        .boxed()
        .shared()
    }
}
