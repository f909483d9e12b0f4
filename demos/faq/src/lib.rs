//! FAQ example
//!
//! One keyed fetch slice under the store key `faq`. A call fetches every
//! requested category concurrently, flattens the answers and orders them by
//! popularity, most popular first. Each distinct `(categories, language)`
//! query gets its own slot.
//!
//! The transport is an in-process [`FaqSource`] loaded from a JSON fixture.

use composable_fetch::{ApiAction, ApiSlice, ApiSliceConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Store key of the FAQ slice
pub const FAQ_STORE_KEY: &str = "faq";

const FIXTURE: &str = include_str!("../data/faq.json");

/// One question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaqEntry {
    /// Category the entry is filed under
    pub category: String,
    /// Language of question and answer
    pub language: String,
    /// The question
    pub question: String,
    /// The answer
    pub answer: String,
    /// How often the entry was viewed
    pub popularity: u32,
}

/// Which FAQ entries to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqQuery {
    /// Categories to aggregate
    pub categories: Vec<String>,
    /// Language of the entries
    pub language: String,
}

impl FaqQuery {
    /// Query for `categories` in `language`
    #[must_use]
    pub fn new<I, S>(categories: I, language: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            language: language.into(),
        }
    }

    /// Slot key of this query
    #[must_use]
    pub fn memo_key(&self) -> String {
        format!("{}|{}", self.categories.join(","), self.language)
    }
}

/// FAQ transport failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaqError {
    /// No entries exist for the category in that language
    #[error("no FAQ for category '{category}' in '{language}'")]
    UnknownCategory {
        /// Requested category
        category: String,
        /// Requested language
        language: String,
    },

    /// The fixture could not be parsed
    #[error("invalid FAQ data: {0}")]
    InvalidData(String),
}

/// In-process FAQ service keyed by `(category, language)`.
#[derive(Debug, Clone)]
pub struct FaqSource {
    entries: Arc<HashMap<(String, String), Vec<FaqEntry>>>,
    latency: Duration,
}

impl FaqSource {
    /// Source backed by the bundled fixture
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::InvalidData`] if the fixture does not parse.
    pub fn bundled() -> Result<Self, FaqError> {
        Self::from_json(FIXTURE)
    }

    /// Source backed by a JSON array of [`FaqEntry`]
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::InvalidData`] if `json` does not parse.
    pub fn from_json(json: &str) -> Result<Self, FaqError> {
        let parsed: Vec<FaqEntry> =
            serde_json::from_str(json).map_err(|error| FaqError::InvalidData(error.to_string()))?;

        let mut entries: HashMap<(String, String), Vec<FaqEntry>> = HashMap::new();
        for entry in parsed {
            entries
                .entry((entry.category.clone(), entry.language.clone()))
                .or_default()
                .push(entry);
        }

        Ok(Self {
            entries: Arc::new(entries),
            latency: Duration::from_millis(5),
        })
    }

    /// Simulated round-trip time of every request
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Entries of one category
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::UnknownCategory`] if nothing is filed under it.
    pub async fn get_faq(&self, category: &str, language: &str) -> Result<Vec<FaqEntry>, FaqError> {
        tracing::debug!(category, language, "GET faq");
        tokio::time::sleep(self.latency).await;

        self.entries
            .get(&(category.to_string(), language.to_string()))
            .cloned()
            .ok_or_else(|| FaqError::UnknownCategory {
                category: category.to_string(),
                language: language.to_string(),
            })
    }
}

/// Fetch every category of `query` concurrently, most popular entries first.
///
/// # Errors
///
/// Fails with the first category that fails.
pub async fn fetch_faq_by_categories(source: FaqSource, query: FaqQuery) -> Result<Vec<FaqEntry>, FaqError> {
    let requests = query
        .categories
        .iter()
        .map(|category| source.get_faq(category, &query.language));

    let mut entries: Vec<FaqEntry> = futures::future::try_join_all(requests)
        .await?
        .into_iter()
        .flatten()
        .collect();

    entries.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    Ok(entries)
}

/// The FAQ slice: raw entries, data as stored, error as its message
pub type FaqSlice = ApiSlice<FaqQuery, Vec<FaqEntry>, FaqError, Vec<FaqEntry>, String>;

/// Actions of the FAQ slice
pub type FaqAction = ApiAction<Vec<FaqEntry>, Vec<FaqEntry>, String>;

/// Build the FAQ slice over `source`
#[must_use]
pub fn faq_slice(source: FaqSource) -> FaqSlice {
    ApiSlice::new(
        ApiSliceConfig::new(FAQ_STORE_KEY, move |query: FaqQuery| {
            fetch_faq_by_categories(source.clone(), query)
        })
        .with_error_payload(|error: &FaqError| error.to_string())
        .with_memoizer(FaqQuery::memo_key),
    )
}
