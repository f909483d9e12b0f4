//! Action type tags and state paths derived from a store key.

use crate::action::ApiAction;
use std::sync::Arc;

/// Namespace under which every fetch slice lives in the [`StateTree`](crate::StateTree).
pub const COMMON_STORE_KEY: &str = "api";

/// Slice identifier, unique per factory call-site (e.g. `"faq"`).
pub type StoreKey = Arc<str>;

/// The five action type tags of one slice plus its path in the state tree.
///
/// Every tag embeds the store key, so tags of two slices never collide.
///
/// ```
/// use composable_fetch::ActionTypes;
///
/// let types = ActionTypes::new("faq");
/// assert_eq!(types.set_fetching, "API/FETCHING/faq");
/// assert_eq!(types.common_path, "api.faq");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTypes {
    store_key: StoreKey,
    /// Response (formatted + raw data) was stored
    pub set_response: String,
    /// Fetching flag changed
    pub set_fetching: String,
    /// Error was stored
    pub set_error: String,
    /// Error was cleared
    pub clear_error: String,
    /// Formatted data was cleared
    pub clear_response: String,
    /// Dotted path from the state root to this slice
    pub common_path: String,
}

impl ActionTypes {
    /// Derive the tags for `store_key`
    #[must_use]
    pub fn new(store_key: impl Into<StoreKey>) -> Self {
        let store_key = store_key.into();
        Self {
            set_response: format!("API/RESPONSE/{store_key}"),
            set_fetching: format!("API/FETCHING/{store_key}"),
            set_error: format!("API/ERROR/{store_key}"),
            clear_error: format!("API/CLEAR_ERROR/{store_key}"),
            clear_response: format!("API/CLEAR_RESPONSE/{store_key}"),
            common_path: format!("{COMMON_STORE_KEY}.{store_key}"),
            store_key,
        }
    }

    /// The store key these tags were derived from
    #[must_use]
    pub fn store_key(&self) -> &StoreKey {
        &self.store_key
    }

    /// Tag of `action` if it targets this slice
    #[must_use]
    pub fn tag_of<T, D, E>(&self, action: &ApiAction<T, D, E>) -> Option<&str> {
        let tag = match action {
            ApiAction::SetFetching { store_key, .. } if *store_key == self.store_key => &self.set_fetching,
            ApiAction::SetResponse { store_key, .. } if *store_key == self.store_key => &self.set_response,
            ApiAction::SetError { store_key, .. } if *store_key == self.store_key => &self.set_error,
            ApiAction::ClearError { store_key, .. } if *store_key == self.store_key => &self.clear_error,
            ApiAction::ClearResponse { store_key, .. } if *store_key == self.store_key => &self.clear_response,
            _ => return None,
        };
        Some(tag)
    }

    /// All five event tags
    #[must_use]
    pub fn all(&self) -> [&str; 5] {
        [
            &self.set_response,
            &self.set_fetching,
            &self.set_error,
            &self.clear_error,
            &self.clear_response,
        ]
    }
}
