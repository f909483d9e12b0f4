//! Error types for fetch orchestration

use thiserror::Error;

/// Outcome of a failed [`ApiSlice::api_call`](crate::ApiSlice::api_call).
///
/// Cloneable so one failed fetch can be handed to every caller that shared it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError<E> {
    /// The fetch function rejected
    ///
    /// The formatted error has already been written to the slice.
    #[error("fetch failed: {0}")]
    Api(E),

    /// The task running the fetch panicked or was cancelled
    #[error("fetch task aborted: {0}")]
    TaskAborted(String),

    /// The slot reads as fetching but this slice has no request in flight
    ///
    /// Happens when something other than [`ApiSlice::api_call`](crate::ApiSlice::api_call)
    /// set the fetching flag.
    #[error("slot of '{store_key}' is marked fetching but no request is in flight")]
    NoPendingRequest {
        /// Slice the call was made on
        store_key: String,
    },
}

impl<E> FetchError<E> {
    /// The fetch function's error, if that is what failed
    #[must_use]
    pub const fn api(&self) -> Option<&E> {
        match self {
            Self::Api(error) => Some(error),
            Self::TaskAborted(_) | Self::NoPendingRequest { .. } => None,
        }
    }

    /// Consume into the fetch function's error, if that is what failed
    #[must_use]
    pub fn into_api(self) -> Option<E> {
        match self {
            Self::Api(error) => Some(error),
            Self::TaskAborted(_) | Self::NoPendingRequest { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_accessors() {
        let error = FetchError::Api("boom".to_string());
        assert_eq!(error.api().map(String::as_str), Some("boom"));
        assert_eq!(error.to_string(), "fetch failed: boom");
        assert_eq!(error.into_api().as_deref(), Some("boom"));

        let missing = FetchError::<String>::NoPendingRequest {
            store_key: "faq".to_string(),
        };
        assert_eq!(missing.api(), None);
        assert!(missing.to_string().contains("'faq'"));
    }
}
