use std::sync::Arc;

use chrono::Utc;

use super::activity::{ActivityStatus, ActivityTracker, ActivityType};
use super::fallback::handle_error;
use super::retry::RetryPolicy;
use super::state::{ResearchState, SearchResult};
use crate::config::SearchConfig;
use crate::search::{SearchBackend, SearchDocument, SearchError, SearchRequest};

/// Issues single queries against the search backend with the run's fixed
/// filtering, and normalizes what comes back.
#[derive(Clone)]
pub struct SearchAdapter {
    backend: Arc<dyn SearchBackend>,
    config: SearchConfig,
    retry: RetryPolicy,
}

impl SearchAdapter {
    pub fn new(backend: Arc<dyn SearchBackend>, config: SearchConfig, retry: RetryPolicy) -> Self {
        Self {
            backend,
            config,
            retry,
        }
    }

    /// Searches for `query`. Never fails: a failed query yields no results.
    pub async fn search(
        &self,
        query: &str,
        state: &ResearchState,
        tracker: &ActivityTracker,
    ) -> Vec<SearchResult> {
        tracker.add(
            ActivityType::Search,
            ActivityStatus::Pending,
            format!("Searching for {}", query),
        );

        let request = SearchRequest::from_config(query, &self.config, Utc::now());
        let label = format!("search for {:?}", query);

        match self.retry.run(&label, || self.attempt(&request)).await {
            Ok(documents) => {
                let results = normalize_documents(documents, self.config.max_content_chars as usize);
                state.record_step();
                tracker.add(
                    ActivityType::Search,
                    ActivityStatus::Complete,
                    format!("Found {} results for {}", results.len(), query),
                );
                results
            }
            Err(e) => handle_error(
                e,
                &format!("Searching for {}", query),
                tracker,
                ActivityType::Search,
                Vec::new(),
            ),
        }
    }

    async fn attempt(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.backend.search(request)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(timeout.as_secs())),
        }
    }
}

/// Drops documents without a title or text body and caps each text at
/// `max_chars` characters.
fn normalize_documents(documents: Vec<SearchDocument>, max_chars: usize) -> Vec<SearchResult> {
    documents
        .into_iter()
        .filter_map(|doc| match (doc.title, doc.text) {
            (Some(title), Some(text)) if !title.is_empty() => Some(SearchResult {
                title,
                url: doc.url,
                content: truncate_chars(text, max_chars),
            }),
            _ => {
                tracing::debug!(url = %doc.url, "dropping search result without title or text");
                None
            }
        })
        .collect()
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    tracing::debug!(max_chars, "truncating search result text");
    text.chars().take(max_chars).collect()
}
