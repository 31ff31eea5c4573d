use futures::future::join_all;
use serde::Deserialize;

use super::activity::{ActivityStatus, ActivityTracker, ActivityType};
use super::fallback::handle_error;
use super::invoker::ModelInvoker;
use super::prompts::{build_extraction_prompt, extraction_schema, EXTRACTION_SYSTEM_PROMPT};
use super::state::{Finding, ResearchState, SearchResult};
use crate::llm::{LLMError, ModelRequest};

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    summary: String,
}

/// Summarizes retrieved documents against the research topic.
#[derive(Clone)]
pub struct ContentExtractor {
    invoker: ModelInvoker,
    model: String,
}

impl ContentExtractor {
    pub fn new(invoker: ModelInvoker, model: impl Into<String>) -> Self {
        Self {
            invoker,
            model: model.into(),
        }
    }

    /// Extracts a finding from one document, or `None` if extraction failed.
    pub async fn extract_content(
        &self,
        content: &str,
        url: &str,
        state: &ResearchState,
        tracker: &ActivityTracker,
    ) -> Option<Finding> {
        tracker.add(
            ActivityType::Extract,
            ActivityStatus::Pending,
            format!("Extracting content from {}", url),
        );

        match self.summarize(content, state).await {
            Ok(summary) => {
                tracker.add(
                    ActivityType::Extract,
                    ActivityStatus::Complete,
                    format!("Extracted content from {}", url),
                );
                Some(Finding {
                    summary,
                    source: url.to_string(),
                })
            }
            Err(e) => handle_error(
                e,
                &format!("Content extraction from {}", url),
                tracker,
                ActivityType::Extract,
                None,
            ),
        }
    }

    async fn summarize(&self, content: &str, state: &ResearchState) -> Result<String, LLMError> {
        let request = ModelRequest::object(
            self.model.as_str(),
            EXTRACTION_SYSTEM_PROMPT,
            build_extraction_prompt(content, state.topic(), state.clarifications_text()),
            extraction_schema(),
        );
        let response: ExtractionResponse = self.invoker.call_object(&request, state).await?;
        Ok(response.summary)
    }

    /// Extracts every result concurrently and waits for all of them.
    ///
    /// Failed extractions are dropped; successes keep the input order.
    pub async fn process_search_results(
        &self,
        results: &[SearchResult],
        state: &ResearchState,
        tracker: &ActivityTracker,
    ) -> Vec<Finding> {
        let extractions = results
            .iter()
            .map(|result| self.extract_content(&result.content, &result.url, state, tracker));

        let findings: Vec<Finding> = join_all(extractions).await.into_iter().flatten().collect();

        tracing::debug!(
            attempted = results.len(),
            extracted = findings.len(),
            "extraction batch settled"
        );
        findings
    }
}
