//! The factory composer: one fetch function in, one slice bundle out.

use crate::action::ApiAction;
use crate::api_call::{ApiCallFn, InFlight};
use crate::constants::{ActionTypes, StoreKey};
use crate::creators::{ActionCreators, DataFormatter, ErrorPayload};
use crate::reducer::ApiReducer;
use crate::selectors::{BoxedSelector, Selectors};
use crate::slot::{Memoizer, SlotKey, SlotResolver};
use crate::state::{SlotMode, StateTree};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Values that can flow through a slice: parameters, payloads and errors.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<X: Clone + Send + Sync + 'static> Payload for X {}

/// Construction options of an [`ApiSlice`].
///
/// - `P`: call parameters (a tuple for several arguments)
/// - `T`: raw response
/// - `Err`: fetch error
/// - `D`: formatted response, defaults to `T`
/// - `E`: formatted error, defaults to `bool`
///
/// # Example
///
/// ```
/// use composable_fetch::ApiSliceConfig;
///
/// let config = ApiSliceConfig::new("users", |page: u32| async move {
///     Ok::<_, String>(vec![format!("user-{page}")])
/// })
/// .with_data_formatter(|users: &Vec<String>| users.len())
/// .with_error_payload(|error: &String| error.clone())
/// .with_memoizer(|page: &u32| page.to_string());
///
/// assert_eq!(config.store_key(), "users");
/// ```
pub struct ApiSliceConfig<P, T, Err, D = T, E = bool> {
    store_key: StoreKey,
    api_call: ApiCallFn<P, T, Err>,
    data_formatter: DataFormatter<T, D>,
    error_payload: ErrorPayload<Err, E>,
    memoizer: Option<Memoizer<P>>,
}

impl<P, T, Err> ApiSliceConfig<P, T, Err>
where
    P: 'static,
    T: Clone + 'static,
    Err: 'static,
{
    /// Options for `store_key` backed by `api_call`.
    ///
    /// Data is stored unformatted and any error is recorded as `true` until
    /// the builder methods say otherwise. Without a memoizer the slice has a
    /// single slot shared by every parameter set.
    pub fn new<F, Fut>(store_key: impl Into<StoreKey>, api_call: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Err>> + Send + 'static,
    {
        Self {
            store_key: store_key.into(),
            api_call: Arc::new(move |params| api_call(params).boxed()),
            data_formatter: Arc::new(|raw: &T| raw.clone()),
            error_payload: Arc::new(|_: &Err| true),
            memoizer: None,
        }
    }
}

impl<P, T, Err, D, E> ApiSliceConfig<P, T, Err, D, E> {
    /// Format raw responses before they are stored under `data`
    #[must_use]
    pub fn with_data_formatter<D2>(
        self,
        formatter: impl Fn(&T) -> D2 + Send + Sync + 'static,
    ) -> ApiSliceConfig<P, T, Err, D2, E> {
        ApiSliceConfig {
            store_key: self.store_key,
            api_call: self.api_call,
            data_formatter: Arc::new(formatter),
            error_payload: self.error_payload,
            memoizer: self.memoizer,
        }
    }

    /// Map fetch errors to the payload stored under `error`
    #[must_use]
    pub fn with_error_payload<E2>(
        self,
        payload: impl Fn(&Err) -> E2 + Send + Sync + 'static,
    ) -> ApiSliceConfig<P, T, Err, D, E2> {
        ApiSliceConfig {
            store_key: self.store_key,
            api_call: self.api_call,
            data_formatter: self.data_formatter,
            error_payload: Arc::new(payload),
            memoizer: self.memoizer,
        }
    }

    /// Give every distinct parameter set its own slot
    #[must_use]
    pub fn with_memoizer(mut self, memoizer: impl Fn(&P) -> String + Send + Sync + 'static) -> Self {
        self.memoizer = Some(Arc::new(memoizer));
        self
    }

    /// The configured store key
    #[must_use]
    pub fn store_key(&self) -> &str {
        &self.store_key
    }
}

impl<P, T, Err, D, E> fmt::Debug for ApiSliceConfig<P, T, Err, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSliceConfig")
            .field("store_key", &self.store_key)
            .field("memoized", &self.memoizer.is_some())
            .finish_non_exhaustive()
    }
}

/// A fetch slice: action creators, reducer and selectors generated from one
/// fetch function, all agreeing on slot addressing.
///
/// Clones share the in-flight registry; two slices built by separate
/// [`ApiSlice::new`] calls share nothing.
pub struct ApiSlice<P, T, Err, D = T, E = bool> {
    pub(crate) types: ActionTypes,
    pub(crate) creators: ActionCreators<P, T, Err, D, E>,
    pub(crate) selectors: Selectors<T, D, E>,
    pub(crate) reducer: ApiReducer<T, D, E>,
    pub(crate) fetch: ApiCallFn<P, T, Err>,
    pub(crate) in_flight: Arc<InFlight<T, Err>>,
}

impl<P, T, Err, D, E> ApiSlice<P, T, Err, D, E>
where
    P: 'static,
    T: Clone + 'static,
    Err: 'static,
    D: Clone + 'static,
    E: Clone + 'static,
{
    /// Wire a slice from `config`
    #[must_use]
    pub fn new(config: ApiSliceConfig<P, T, Err, D, E>) -> Self {
        let types = ActionTypes::new(config.store_key);
        let slots = SlotResolver::new(config.memoizer);
        let mode = slots.mode();
        tracing::debug!(store_key = %types.store_key(), ?mode, "Created fetch slice");

        Self {
            creators: ActionCreators::new(
                types.store_key().clone(),
                slots,
                config.data_formatter,
                config.error_payload,
            ),
            selectors: Selectors::new(&types),
            reducer: ApiReducer::new(types.clone(), mode),
            fetch: config.api_call,
            in_flight: Arc::default(),
            types,
        }
    }

    /// Action tags and state path of this slice
    #[must_use]
    pub const fn action_types(&self) -> &ActionTypes {
        &self.types
    }

    /// The slice's store key
    #[must_use]
    pub fn store_key(&self) -> &StoreKey {
        self.types.store_key()
    }

    /// Single or keyed addressing
    #[must_use]
    pub const fn slot_mode(&self) -> SlotMode {
        self.reducer.mode()
    }

    /// Slot key `params` resolve to
    #[must_use]
    pub fn slot_key(&self, params: &P) -> Option<SlotKey> {
        self.creators.slot_key(params)
    }

    /// The synchronous action creators
    #[must_use]
    pub const fn creators(&self) -> &ActionCreators<P, T, Err, D, E> {
        &self.creators
    }

    /// See [`ActionCreators::set_fetching`]
    #[must_use]
    pub fn set_fetching(&self, is_fetching: bool, params: &P) -> ApiAction<T, D, E> {
        self.creators.set_fetching(is_fetching, params)
    }

    /// See [`ActionCreators::clear_error`]
    #[must_use]
    pub fn clear_error(&self, params: &P) -> ApiAction<T, D, E> {
        self.creators.clear_error(params)
    }

    /// See [`ActionCreators::set_data`]
    #[must_use]
    pub fn set_data(&self, raw_data: T, params: &P) -> ApiAction<T, D, E> {
        self.creators.set_data(raw_data, params)
    }

    /// See [`ActionCreators::set_error`]
    #[must_use]
    pub fn set_error(&self, error: &Err, params: &P) -> ApiAction<T, D, E> {
        self.creators.set_error(error, params)
    }

    /// See [`ActionCreators::clear_data`]
    #[must_use]
    pub fn clear_data(&self, params: &P) -> ApiAction<T, D, E> {
        self.creators.clear_data(params)
    }

    /// The slice's selectors
    #[must_use]
    pub const fn selectors(&self) -> &Selectors<T, D, E> {
        &self.selectors
    }

    /// Fetching flag at `slot`
    #[must_use]
    pub fn fetching_status(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<bool> {
        self.selectors.fetching_status(tree, slot)
    }

    /// Formatted data at `slot`
    #[must_use]
    pub fn data(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<D> {
        self.selectors.data(tree, slot)
    }

    /// Raw data at `slot`
    #[must_use]
    pub fn raw_data(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<T> {
        self.selectors.raw_data(tree, slot)
    }

    /// Formatted error at `slot`
    #[must_use]
    pub fn error(&self, tree: &StateTree, slot: Option<&SlotKey>) -> Option<E> {
        self.selectors.error(tree, slot)
    }

    /// Bind `selector` to the slot of `params`.
    ///
    /// ```
    /// use composable_fetch::{ApiSlice, ApiSliceConfig, Selectors, StateTree};
    ///
    /// let slice = ApiSlice::new(
    ///     ApiSliceConfig::new("faq", |lang: String| async move { Ok::<_, ()>(lang) })
    ///         .with_memoizer(|lang: &String| lang.clone()),
    /// );
    /// let english_data = slice.parametrized_selector(Selectors::data, &"en".to_string());
    /// assert_eq!(english_data(&StateTree::new()), None);
    /// ```
    #[must_use]
    pub fn parametrized_selector<V, F>(&self, selector: F, params: &P) -> BoxedSelector<V>
    where
        F: Fn(&Selectors<T, D, E>, &StateTree, Option<&SlotKey>) -> Option<V> + Send + Sync + 'static,
        V: 'static,
    {
        let selectors = self.selectors.clone();
        let slot = self.slot_key(params);
        Box::new(move |tree: &StateTree| selector(&selectors, tree, slot.as_ref()))
    }

    /// The slice's reducer, ready to register
    #[must_use]
    pub fn reducer(&self) -> ApiReducer<T, D, E> {
        self.reducer.clone()
    }
}

impl<P, T, Err, D, E> Clone for ApiSlice<P, T, Err, D, E> {
    fn clone(&self) -> Self {
        Self {
            types: self.types.clone(),
            creators: self.creators.clone(),
            selectors: self.selectors.clone(),
            reducer: self.reducer.clone(),
            fetch: Arc::clone(&self.fetch),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<P, T, Err, D, E> fmt::Debug for ApiSlice<P, T, Err, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSlice")
            .field("types", &self.types)
            .field("reducer", &self.reducer)
            .finish_non_exhaustive()
    }
}
