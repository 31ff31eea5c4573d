//! Web search backends.
//!
//! The research engine talks to search through [`SearchBackend`]; the
//! only bundled implementation is [`ExaClient`].

mod error;
mod exa;

pub use error::SearchError;
pub use exa::ExaClient;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::SearchConfig;

/// How the backend should interpret the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Keyword,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Keyword => "keyword",
        }
    }
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The range covering the `days` days before `now`.
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }
}

/// One query issued to a search backend.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: SearchType,
    pub max_results: u32,
    pub published: DateRange,
    pub crawled: DateRange,
    pub excluded_domains: Vec<String>,
    /// Page text is truncated to this many characters per document.
    pub max_content_chars: u32,
}

impl SearchRequest {
    /// Builds the request for `query` from the search configuration,
    /// with publish and crawl windows ending at `now`.
    pub fn from_config(query: impl Into<String>, config: &SearchConfig, now: DateTime<Utc>) -> Self {
        let window = DateRange::trailing_days(now, config.window_days);
        Self {
            query: query.into(),
            search_type: SearchType::Keyword,
            max_results: config.max_results,
            published: window,
            crawled: window,
            excluded_domains: config.exclude_domains.clone(),
            max_content_chars: config.max_content_chars,
        }
    }
}

/// A ranked document as returned by the backend, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    pub title: Option<String>,
    pub url: String,
    pub text: Option<String>,
}

/// Trait for web search backends.
///
/// An empty result list is a valid answer, distinct from an error.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError>;
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl SearchBackend for Box<dyn SearchBackend> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError> {
        (**self).search(request).await
    }
}

/// Creates the search backend named in the configuration.
pub fn backend_from_config(config: &SearchConfig) -> Result<Box<dyn SearchBackend>, SearchError> {
    match config.provider.as_str() {
        "exa" => {
            let key = config.api_key_or_env().ok_or(SearchError::MissingApiKey)?;
            Ok(Box::new(ExaClient::new(config.base_url_or_default(), key)))
        }
        other => Err(SearchError::UnknownProvider(other.to_string())),
    }
}
