use serde::Deserialize;

use super::invoker::ModelInvoker;
use super::prompts::{build_questions_prompt, questions_schema, QUESTIONS_SYSTEM_PROMPT};
use crate::llm::{LLMError, ModelOutput, ModelRequest};

/// Upper bound on questions shown to the user.
const MAX_QUESTIONS: usize = 4;

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    #[serde(default)]
    questions: Vec<String>,
}

/// Asks the model for clarifying questions about `topic`.
///
/// Runs before any research state exists, so usage is not counted.
/// Returns an empty list when the model call fails.
pub async fn generate_questions(invoker: &ModelInvoker, model: &str, topic: &str) -> Vec<String> {
    match request_questions(invoker, model, topic).await {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!("Generating clarifying questions failed: {}", e);
            Vec::new()
        }
    }
}

async fn request_questions(
    invoker: &ModelInvoker,
    model: &str,
    topic: &str,
) -> Result<Vec<String>, LLMError> {
    let request = ModelRequest::object(
        model,
        QUESTIONS_SYSTEM_PROMPT,
        build_questions_prompt(topic),
        questions_schema(),
    );

    let value = match invoker.call_untracked(&request).await?.output {
        ModelOutput::Object(value) => value,
        ModelOutput::Text(_) => {
            return Err(LLMError::SchemaViolation(
                "expected a structured object, got free-form text".to_string(),
            ))
        }
    };
    let response: QuestionsResponse =
        serde_json::from_value(value).map_err(|e| LLMError::SchemaViolation(e.to_string()))?;

    Ok(response
        .questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(MAX_QUESTIONS)
        .collect())
}
