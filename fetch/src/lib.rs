//! # Composable Fetch
//!
//! Parametrized fetch-state slices for the Composable Fetch architecture.
//!
//! One asynchronous fetch function and a store key produce an [`ApiSlice`]:
//!
//! - **Action creators** building [`ApiAction`]s for a parameter set
//! - **Reducer** ([`ApiReducer`]) owning `api.<store key>` in the [`StateTree`]
//! - **Selectors** reading fetching flag, data, raw data and error per slot
//! - **Orchestration** ([`ApiSlice::api_call`]) with cache short-circuit and
//!   in-flight deduplication
//!
//! Without a memoizer a slice has one slot. With one, every distinct
//! memoized parameter set gets its own slot and the creators, reducer and
//! selectors all agree on it.
//!
//! ## Example
//!
//! ```
//! use composable_fetch::{ApiAction, ApiSlice, ApiSliceConfig, StateTree};
//! use composable_fetch_runtime::Store;
//!
//! # tokio_test::block_on(async {
//! let faq = ApiSlice::new(
//!     ApiSliceConfig::new("faq", |lang: String| async move {
//!         Ok::<_, String>(vec![format!("How do I sign in? ({lang})")])
//!     })
//!     .with_data_formatter(|questions: &Vec<String>| questions.len())
//!     .with_memoizer(|lang: &String| lang.clone()),
//! );
//!
//! let store = Store::new(StateTree::new(), faq.reducer(), ());
//! let questions = faq.api_call(&store, "en".to_string()).await;
//! assert_eq!(questions.map(|q| q.len()), Ok(1));
//!
//! let slot = faq.slot_key(&"en".to_string());
//! let count = store.state(|tree| faq.data(tree, slot.as_ref())).await;
//! assert_eq!(count, Some(1));
//! # });
//! ```

mod api_call;
mod creators;
mod factory;
mod registry;

pub mod action;
pub mod constants;
pub mod error;
pub mod reducer;
pub mod selectors;
pub mod slot;
pub mod state;

pub use action::ApiAction;
pub use api_call::ApiCallFn;
pub use constants::{ActionTypes, COMMON_STORE_KEY, StoreKey};
pub use creators::{ActionCreators, DataFormatter, ErrorPayload};
pub use error::FetchError;
pub use factory::{ApiSlice, ApiSliceConfig, Payload};
pub use reducer::ApiReducer;
pub use registry::ReducerRegistry;
pub use selectors::{BoxedSelector, Selectors};
pub use slot::{FieldUpdate, Memoizer, SlotKey, SlotResolver, merge_fields_at_slot};
pub use state::{ApiNamespace, SliceState, SlotMode, Slotted, StateTree};
