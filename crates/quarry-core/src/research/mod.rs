//! The research orchestration engine.
//!
//! [`ResearchRunner`] drives a run from planning through the search,
//! extraction and analysis iterations to the final report, reporting
//! progress on an [`EventSink`].

mod activity;
mod clarify;
mod document;
mod extractor;
mod fallback;
mod invoker;
pub mod prompts;
mod retry;
mod runner;
mod search;
mod state;

pub use activity::{
    Activity, ActivityStatus, ActivityTracker, ActivityType, EventSink, ResearchEvent,
};
pub use clarify::generate_questions;
pub use document::{extract_report_body, ReportError, ReportFormat, ResearchReport};
pub use extractor::ContentExtractor;
pub use fallback::handle_error;
pub use invoker::ModelInvoker;
pub use retry::RetryPolicy;
pub use runner::{
    fallback_queries, next_queries, ResearchError, ResearchOutcome, ResearchRunner,
    REPORT_ERROR_MESSAGE,
};
pub use search::SearchAdapter;
pub use state::{
    clarifications_text, combine_findings, AnalysisResult, Clarification, Finding, Gaps,
    ResearchState, SearchResult,
};
