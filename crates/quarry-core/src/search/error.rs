use thiserror::Error;

/// Errors that can occur while querying a search backend.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing search API key. Set EXA_API_KEY or QUARRY_SEARCH_API_KEY.")]
    MissingApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse search response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Search timed out after {0}s")]
    Timeout(u64),

    #[error("Unknown search provider: {0}")]
    UnknownProvider(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Network(err.to_string())
    }
}
