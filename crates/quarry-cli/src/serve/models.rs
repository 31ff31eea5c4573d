//! API request/response types for the research server.

use quarry_core::research::Clarification;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate-questions`.
#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    pub topic: String,
}

/// Response for `POST /api/generate-questions`.
#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

/// Body of `POST /api/deep-research`.
#[derive(Debug, Deserialize)]
pub struct DeepResearchRequest {
    pub topic: String,
    #[serde(default)]
    pub clarifications: Vec<Clarification>,
}

/// Returned for requests that could not be accepted.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Response for `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
