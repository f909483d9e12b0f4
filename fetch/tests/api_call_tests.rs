//! Fetch orchestration against a recording dispatcher.

use composable_fetch::{ApiAction, ApiSlice, ApiSliceConfig, FetchError, Selectors, SlotKey, StateTree};
use composable_fetch_runtime::{Dispatcher, StoreError};
use composable_fetch_testing::{MockApiCall, RecordingDispatcher, init_tracing};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Reply {
    ok: bool,
}

#[derive(Debug, Clone)]
struct Params {
    test: bool,
}

type TestSlice = ApiSlice<(), Reply, Reply, Reply, Reply>;
type TestAction = ApiAction<Reply, Reply, Reply>;
type TestDispatcher = RecordingDispatcher<StateTree, TestAction>;

fn slice_over(api: &MockApiCall<Reply, Reply>) -> TestSlice {
    let fetch = api.clone();
    ApiSlice::new(
        ApiSliceConfig::new("test", move |params: ()| fetch.call(params))
            .with_error_payload(|error: &Reply| error.clone()),
    )
}

fn live(slice: &TestSlice) -> TestDispatcher {
    RecordingDispatcher::live(StateTree::new(), slice.reducer(), ())
}

fn action_types(dispatcher: &TestDispatcher) -> Vec<String> {
    dispatcher.actions().iter().map(ApiAction::action_type).collect()
}

/// Never completes its first dispatch; later ones go through.
#[derive(Clone)]
struct StallFirstDispatch {
    inner: TestDispatcher,
    stall: Arc<AtomicBool>,
}

impl StallFirstDispatch {
    fn new(inner: TestDispatcher) -> Self {
        Self {
            inner,
            stall: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Dispatcher<StateTree, TestAction> for StallFirstDispatch {
    fn dispatch(&self, action: TestAction) -> impl Future<Output = Result<(), StoreError>> + Send {
        let inner = self.inner.clone();
        let stall = self.stall.swap(false, Ordering::SeqCst);
        async move {
            if stall {
                std::future::pending::<()>().await;
            }
            inner.dispatch(action).await
        }
    }

    fn select<T, F>(&self, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&StateTree) -> T + Send,
        T: Send,
    {
        self.inner.select(f)
    }
}

async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(check(), "condition never became true");
}

#[tokio::test]
async fn test_success_path() {
    init_tracing();
    let api = MockApiCall::resolving(Reply { ok: true }).gated();
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    let call = tokio::spawn({
        let slice = slice.clone();
        let dispatcher = dispatcher.clone();
        async move { slice.api_call(&dispatcher, ()).await }
    });

    eventually(|| slice.fetching_status(&dispatcher.state(), None) == Some(true)).await;
    assert_eq!(slice.data(&dispatcher.state(), None), None);
    assert_eq!(slice.in_flight().await, 1);

    api.open();
    let result = call.await;
    assert!(matches!(result, Ok(Ok(Reply { ok: true }))));

    let state = dispatcher.state();
    assert_eq!(slice.fetching_status(&state, None), Some(false));
    assert_eq!(slice.data(&state, None), Some(Reply { ok: true }));
    assert_eq!(slice.raw_data(&state, None), Some(Reply { ok: true }));
    assert_eq!(slice.error(&state, None), None);
    assert_eq!(slice.in_flight().await, 0);

    let types = slice.action_types();
    assert_eq!(
        action_types(&dispatcher),
        vec![
            types.set_fetching.clone(),
            types.set_fetching.clone(),
            types.clear_error.clone(),
            types.set_response.clone(),
        ]
    );
}

#[tokio::test]
async fn test_failure_path() {
    init_tracing();
    let api = MockApiCall::rejecting(Reply { ok: false });
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    let result = slice.api_call(&dispatcher, ()).await;
    assert_eq!(result, Err(FetchError::Api(Reply { ok: false })));

    let state = dispatcher.state();
    assert_eq!(slice.fetching_status(&state, None), Some(false));
    assert_eq!(slice.data(&state, None), None);
    assert_eq!(slice.error(&state, None), Some(Reply { ok: false }));

    let types = slice.action_types();
    assert_eq!(
        action_types(&dispatcher),
        vec![types.set_fetching.clone(), types.set_fetching.clone(), types.set_error.clone()]
    );
}

#[tokio::test]
async fn test_constant_memoizer_slot_lifecycle() {
    let api: MockApiCall<Reply, Reply> = MockApiCall::resolving(Reply { ok: true });
    let fetch = api.clone();
    let slice = ApiSlice::new(
        ApiSliceConfig::new("test", move |params: Params| fetch.call(params))
            .with_memoizer(|_: &Params| "test".to_string()),
    );
    let dispatcher = RecordingDispatcher::live(StateTree::new(), slice.reducer(), ());

    let params = Params { test: true };
    assert_eq!(slice.slot_key(&params), Some(SlotKey::from("test")));

    let fetching = slice.parametrized_selector(Selectors::fetching_status, &params);
    let data = slice.parametrized_selector(Selectors::data, &params);
    assert_eq!(fetching(&dispatcher.state()), None);

    let result = slice.api_call(&dispatcher, params).await;
    assert_eq!(result, Ok(Reply { ok: true }));
    assert_eq!(fetching(&dispatcher.state()), Some(false));
    assert_eq!(data(&dispatcher.state()), Some(Reply { ok: true }));
    assert_eq!(api.received(), vec!["Params { test: true }".to_string()]);

    // other parameters, same slot key: same data
    let colliding = slice.parametrized_selector(Selectors::data, &Params { test: false });
    assert_eq!(colliding(&dispatcher.state()), Some(Reply { ok: true }));
}

#[tokio::test]
async fn test_cached_raw_data_short_circuits() {
    let api = MockApiCall::resolving(Reply { ok: true });
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    assert_eq!(slice.api_call(&dispatcher, ()).await, Ok(Reply { ok: true }));
    dispatcher.clear_actions();
    let attempts = dispatcher.dispatch_attempts();

    api.set_outcome(Ok(Reply { ok: false }));
    assert_eq!(slice.api_call(&dispatcher, ()).await, Ok(Reply { ok: true }));

    assert_eq!(api.calls(), 1);
    assert!(dispatcher.actions().is_empty());
    assert_eq!(dispatcher.dispatch_attempts(), attempts);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_fetch() {
    let api = MockApiCall::resolving(Reply { ok: true }).gated();
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    let (first, second, ()) = tokio::join!(
        slice.api_call(&dispatcher, ()),
        slice.api_call(&dispatcher, ()),
        async {
            tokio::task::yield_now().await;
            api.open();
        },
    );

    assert_eq!(first, Ok(Reply { ok: true }));
    assert_eq!(second, Ok(Reply { ok: true }));
    assert_eq!(api.calls(), 1);
    assert_eq!(dispatcher.actions().len(), 4);
}

#[tokio::test]
async fn test_concurrent_failure_reaches_every_caller() {
    let api = MockApiCall::rejecting(Reply { ok: false }).gated();
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    let (first, second, ()) = tokio::join!(
        slice.api_call(&dispatcher, ()),
        slice.api_call(&dispatcher, ()),
        async {
            tokio::task::yield_now().await;
            api.open();
        },
    );

    assert_eq!(first, Err(FetchError::Api(Reply { ok: false })));
    assert_eq!(second, first);
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_failure_then_refetch() {
    let api = MockApiCall::rejecting(Reply { ok: false });
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    assert!(slice.api_call(&dispatcher, ()).await.is_err());
    assert_eq!(slice.in_flight().await, 0);

    api.set_outcome(Ok(Reply { ok: true }));
    assert_eq!(slice.api_call(&dispatcher, ()).await, Ok(Reply { ok: true }));
    assert_eq!(api.calls(), 2);

    let state = dispatcher.state();
    assert_eq!(slice.error(&state, None), None);
    assert_eq!(slice.data(&state, None), Some(Reply { ok: true }));
}

#[tokio::test]
async fn test_foreign_fetching_flag_has_no_pending_request() {
    let api = MockApiCall::resolving(Reply { ok: true });
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    let marked = dispatcher.dispatch(slice.set_fetching(true, &())).await;
    assert!(marked.is_ok());

    let result = slice.api_call(&dispatcher, ()).await;
    assert_eq!(
        result,
        Err(FetchError::NoPendingRequest {
            store_key: "test".to_string()
        })
    );
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_rejected_dispatches_keep_fetch_outcome() {
    init_tracing();
    let api = MockApiCall::resolving(Reply { ok: true });
    let slice = slice_over(&api);
    let dispatcher = live(&slice);
    dispatcher.reject_dispatches();

    assert_eq!(slice.api_call(&dispatcher, ()).await, Ok(Reply { ok: true }));
    assert_eq!(dispatcher.dispatch_attempts(), 4);
    assert!(dispatcher.state().api().is_empty());
}

#[tokio::test]
async fn test_dropped_caller_still_settles() {
    let api = MockApiCall::resolving(Reply { ok: true }).gated();
    let slice = slice_over(&api);
    let dispatcher = live(&slice);

    let call = tokio::spawn({
        let slice = slice.clone();
        let dispatcher = dispatcher.clone();
        async move { slice.api_call(&dispatcher, ()).await }
    });
    eventually(|| slice.fetching_status(&dispatcher.state(), None) == Some(true)).await;

    call.abort();
    assert!(call.await.is_err());
    api.open();

    eventually(|| slice.data(&dispatcher.state(), None).is_some()).await;
    assert_eq!(slice.fetching_status(&dispatcher.state(), None), Some(false));
    assert_eq!(slice.in_flight().await, 0);
}

#[tokio::test]
async fn test_slices_do_not_share_in_flight_requests() {
    let api = MockApiCall::resolving(Reply { ok: true }).gated();
    let first = slice_over(&api);
    let second = slice_over(&api);
    let dispatcher = RecordingDispatcher::<StateTree, TestAction>::detached(StateTree::new());

    let (a, b, ()) = tokio::join!(
        first.api_call(&dispatcher, ()),
        second.api_call(&dispatcher, ()),
        async {
            tokio::task::yield_now().await;
            api.open();
        },
    );

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn test_caller_dropped_before_fetch_start_applied_still_dedups() {
    let api = MockApiCall::resolving(Reply { ok: true }).gated();
    let slice = slice_over(&api);
    let recorder = live(&slice);
    let dispatcher = StallFirstDispatch::new(recorder.clone());

    let first = tokio::time::timeout(Duration::from_millis(20), slice.api_call(&dispatcher, ())).await;
    assert!(first.is_err());
    assert_eq!(slice.in_flight().await, 1);
    assert_eq!(slice.fetching_status(&recorder.state(), None), None);

    let second = tokio::spawn({
        let slice = slice.clone();
        let dispatcher = dispatcher.clone();
        async move { slice.api_call(&dispatcher, ()).await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(api.calls(), 1);

    api.open();
    assert!(matches!(second.await, Ok(Ok(Reply { ok: true }))));
    assert_eq!(api.calls(), 1);
    assert_eq!(slice.in_flight().await, 0);

    let state = recorder.state();
    assert_eq!(slice.fetching_status(&state, None), Some(false));
    assert_eq!(slice.data(&state, None), Some(Reply { ok: true }));
}
