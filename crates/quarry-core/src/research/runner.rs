use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::activity::{Activity, ActivityStatus, ActivityTracker, ActivityType, EventSink};
use super::clarify::generate_questions;
use super::extractor::ContentExtractor;
use super::fallback::handle_error;
use super::invoker::ModelInvoker;
use super::prompts::{
    analysis_schema, build_analysis_prompt, build_planning_prompt, build_report_prompt,
    planning_schema, ANALYSIS_SYSTEM_PROMPT, PLANNING_SYSTEM_PROMPT, REPORT_SYSTEM_PROMPT,
};
use super::retry::RetryPolicy;
use super::search::SearchAdapter;
use super::state::{AnalysisResult, Clarification, Finding, Gaps, ResearchState, SearchResult};
use crate::config::{Config, ConfigError, ModelConfig, ResearchConfig, PLANNED_QUERY_COUNT};
use crate::llm::{LLMError, ModelRequest, Provider, LLM};
use crate::search::{backend_from_config, SearchBackend, SearchError};

/// Report text used when report generation fails.
pub const REPORT_ERROR_MESSAGE: &str = "Error generating report. Please try again.";

/// Drives a research run: planning, then search/extract/analyze
/// iterations, then the final report.
pub struct ResearchRunner {
    invoker: ModelInvoker,
    search: SearchAdapter,
    extractor: ContentExtractor,
    models: ModelConfig,
    config: ResearchConfig,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    /// The report text exactly as emitted on the event sink.
    pub report: String,
    pub findings: Vec<Finding>,
    /// Every activity in emission order.
    pub activities: Vec<Activity>,
    pub tokens_used: u64,
    pub completed_steps: u64,
    /// Number of search iterations that ran.
    pub iterations: u32,
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    #[serde(rename = "searchQueries")]
    search_queries: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    sufficient: bool,
    #[serde(default)]
    gaps: Gaps,
    #[serde(default)]
    queries: Vec<String>,
}

impl ResearchRunner {
    /// Creates a runner over the given backends.
    pub fn new(llm: Arc<dyn LLM>, search: Arc<dyn SearchBackend>, config: &Config) -> Self {
        let retry = RetryPolicy::from_config(&config.research);
        let invoker = ModelInvoker::new(llm, retry, config.llm.timeout());

        Self {
            extractor: ContentExtractor::new(invoker.clone(), config.models.extraction.clone()),
            search: SearchAdapter::new(search, config.search.clone(), retry),
            invoker,
            models: config.models.clone(),
            config: config.research.clone(),
        }
    }

    /// Creates a runner with the LLM and search backends named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, ResearchError> {
        config.validate()?;
        let llm = Provider::from_config(&config.llm)?.build_with_max_tokens(config.llm.max_tokens)?;
        let search = backend_from_config(&config.search)?;
        Ok(Self::new(Arc::from(llm), Arc::from(search), config))
    }

    /// Proposes clarifying questions for `topic`. Empty on failure.
    pub async fn generate_questions(&self, topic: &str) -> Vec<String> {
        generate_questions(&self.invoker, &self.models.questions, topic).await
    }

    /// Runs the full research loop, emitting every activity and finally
    /// exactly one report on `sink`.
    ///
    /// Never fails: each phase degrades to its fallback value, so a report
    /// event is always emitted.
    #[tracing::instrument(skip(self, clarifications, sink), fields(topic = %topic))]
    pub async fn run(
        &self,
        topic: &str,
        clarifications: &[Clarification],
        sink: EventSink,
    ) -> ResearchOutcome {
        let tracker = ActivityTracker::new(sink);
        let mut state = ResearchState::new(topic, clarifications);

        let mut queries = self.generate_search_queries(&state, &tracker).await;
        let mut issued: HashSet<String> = queries.iter().cloned().collect();
        let mut iteration = 0;

        while !queries.is_empty() && iteration < self.config.max_iterations {
            iteration += 1;
            tracing::debug!(iteration, queries = ?queries, "starting iteration");

            let results = self.search_all(&queries, &state, &tracker).await;
            let batch = unprocessed(results, &state);
            let findings = self
                .extractor
                .process_search_results(&batch, &state, &tracker)
                .await;
            state.add_findings(findings);

            let analysis = self
                .analyze_findings(&state, &queries, iteration, &tracker)
                .await;
            if analysis.sufficient {
                tracing::debug!(iteration, "findings judged sufficient");
                break;
            }

            let history = self.config.dedupe_query_history.then_some(&issued);
            queries = next_queries(
                &queries,
                analysis.queries,
                history,
                self.config.max_follow_up_queries,
            );
            issued.extend(queries.iter().cloned());
        }

        let report = self.generate_report(&state, &tracker).await;
        tracker.report(report.clone());

        tracing::info!(
            iterations = iteration,
            findings = state.findings().len(),
            tokens = state.tokens_used(),
            steps = state.completed_steps(),
            "research run finished"
        );

        ResearchOutcome {
            report,
            tokens_used: state.tokens_used(),
            completed_steps: state.completed_steps(),
            iterations: iteration,
            activities: tracker.into_history(),
            findings: state.into_findings(),
        }
    }

    /// Plans the initial queries, falling back to topic templates.
    pub async fn generate_search_queries(
        &self,
        state: &ResearchState,
        tracker: &ActivityTracker,
    ) -> Vec<String> {
        tracker.add(
            ActivityType::Planning,
            ActivityStatus::Pending,
            "Planning the research",
        );

        match self.plan(state).await {
            Ok(queries) => {
                tracker.add(
                    ActivityType::Planning,
                    ActivityStatus::Complete,
                    "Crafted the research plan",
                );
                queries
            }
            Err(e) => handle_error(
                e,
                "Research planning",
                tracker,
                ActivityType::Planning,
                fallback_queries(state.topic()),
            ),
        }
    }

    async fn plan(&self, state: &ResearchState) -> Result<Vec<String>, LLMError> {
        let request = ModelRequest::object(
            self.models.planning.as_str(),
            PLANNING_SYSTEM_PROMPT,
            build_planning_prompt(state.topic(), state.clarifications_text()),
            planning_schema(),
        );
        let plan: PlanResponse = self.invoker.call_object(&request, state).await?;

        let queries: Vec<String> = plan
            .search_queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .collect();
        if queries.len() != PLANNED_QUERY_COUNT || queries.iter().any(|q| q.is_empty()) {
            return Err(LLMError::SchemaViolation(format!(
                "expected exactly {} non-empty search queries, got {:?}",
                PLANNED_QUERY_COUNT, queries
            )));
        }
        Ok(queries)
    }

    /// Runs every query concurrently and flattens the non-empty result sets.
    pub async fn search_all(
        &self,
        queries: &[String],
        state: &ResearchState,
        tracker: &ActivityTracker,
    ) -> Vec<SearchResult> {
        let searches = queries
            .iter()
            .map(|query| self.search.search(query, state, tracker));

        join_all(searches)
            .await
            .into_iter()
            .filter(|results| !results.is_empty())
            .flatten()
            .collect()
    }

    /// Judges the accumulated findings. Falls back to an insufficient
    /// verdict with no follow-up queries.
    pub async fn analyze_findings(
        &self,
        state: &ResearchState,
        current_queries: &[String],
        iteration: u32,
        tracker: &ActivityTracker,
    ) -> AnalysisResult {
        tracker.add(
            ActivityType::Analyze,
            ActivityStatus::Pending,
            format!(
                "Analyzing research findings (iteration {} of {})",
                iteration, self.config.max_iterations
            ),
        );

        match self.analyze(state, current_queries, iteration).await {
            Ok(analysis) => {
                let verdict = if analysis.sufficient {
                    "content is sufficient"
                } else {
                    "more research is needed"
                };
                tracker.add(
                    ActivityType::Analyze,
                    ActivityStatus::Complete,
                    format!("Analyzed the collected research findings: {}", verdict),
                );
                analysis
            }
            Err(e) => handle_error(
                e,
                "Analyzing research findings",
                tracker,
                ActivityType::Analyze,
                AnalysisResult::fallback(),
            ),
        }
    }

    async fn analyze(
        &self,
        state: &ResearchState,
        current_queries: &[String],
        iteration: u32,
    ) -> Result<AnalysisResult, LLMError> {
        let request = ModelRequest::object(
            self.models.analysis.as_str(),
            ANALYSIS_SYSTEM_PROMPT,
            build_analysis_prompt(
                &state.combined_findings(),
                state.topic(),
                state.clarifications_text(),
                current_queries,
                iteration,
                self.config.max_iterations,
            ),
            analysis_schema(),
        );
        let response: AnalysisResponse = self.invoker.call_object(&request, state).await?;

        Ok(AnalysisResult {
            sufficient: response.sufficient,
            gaps: response.gaps.into_list(),
            queries: response.queries,
        })
    }

    /// Writes the final report as free-form text, or returns
    /// [`REPORT_ERROR_MESSAGE`] on failure.
    pub async fn generate_report(&self, state: &ResearchState, tracker: &ActivityTracker) -> String {
        tracker.add(
            ActivityType::Generate,
            ActivityStatus::Pending,
            "Generating comprehensive report",
        );

        let request = ModelRequest::text(
            self.models.report.as_str(),
            REPORT_SYSTEM_PROMPT,
            build_report_prompt(
                &state.combined_findings(),
                state.topic(),
                state.clarifications_text(),
            ),
        );

        match self.invoker.call_text(&request, state).await {
            Ok(report) => {
                tracker.add(
                    ActivityType::Generate,
                    ActivityStatus::Complete,
                    format!(
                        "Generated comprehensive report. Total tokens used: {}. Research completed in {} steps.",
                        state.tokens_used(),
                        state.completed_steps()
                    ),
                );
                report
            }
            Err(e) => handle_error(
                e,
                "Report generation",
                tracker,
                ActivityType::Generate,
                REPORT_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

/// Template queries used when planning fails.
pub fn fallback_queries(topic: &str) -> Vec<String> {
    vec![
        format!("{} best practices", topic),
        format!("{} guidelines", topic),
        format!("{} examples", topic),
    ]
}

/// Picks the next iteration's queries from the analysis proposals.
///
/// Proposals are trimmed, blanks and repeats dropped, and anything in
/// `current` removed. With `history`, queries issued in any earlier
/// iteration are removed as well. At most `limit` are kept.
pub fn next_queries(
    current: &[String],
    proposed: Vec<String>,
    history: Option<&HashSet<String>>,
    limit: usize,
) -> Vec<String> {
    let mut seen: HashSet<String> = current.iter().cloned().collect();
    if let Some(history) = history {
        seen.extend(history.iter().cloned());
    }

    proposed
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .filter(|q| seen.insert(q.clone()))
        .take(limit)
        .collect()
}

/// Drops results whose URL was already extracted in this run, or that
/// repeat a URL earlier in the batch.
fn unprocessed(results: Vec<SearchResult>, state: &ResearchState) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| {
            let fresh = !state.is_processed(&r.url) && seen.insert(r.url.clone());
            if !fresh {
                tracing::debug!(url = %r.url, "skipping already processed url");
            }
            fresh
        })
        .collect()
}

/// Errors that can occur while setting up a research runner.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}
