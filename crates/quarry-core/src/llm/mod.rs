mod error;
mod openai;
mod provider;

pub use error::LLMError;
pub use openai::OpenAIClient;
pub use provider::Provider;

use async_trait::async_trait;
use serde_json::Value;

/// A description of the structured shape a model must return.
///
/// `schema` is a JSON Schema object. Per-field constraints (lengths,
/// minimum sizes) are expressed in the schema itself and enforced by the
/// provider's constrained generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSchema {
    /// Short identifier sent alongside the schema.
    pub name: String,
    /// The JSON Schema document.
    pub schema: Value,
}

impl ResultSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// One request to a language model.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Target model identifier. Empty means the provider's fallback model.
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// System instructions.
    pub system: String,
    /// When present the call returns a JSON object conforming to it;
    /// otherwise it returns free-form text.
    pub schema: Option<ResultSchema>,
}

impl ModelRequest {
    /// Creates a free-form text request.
    pub fn text(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: system.into(),
            schema: None,
        }
    }

    /// Creates a structured-output request.
    pub fn object(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
        schema: ResultSchema,
    ) -> Self {
        Self {
            schema: Some(schema),
            ..Self::text(model, system, prompt)
        }
    }
}

/// The payload returned by a model call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// A schema-conforming JSON object.
    Object(Value),
    /// A plain text completion.
    Text(String),
}

/// A model reply together with its token usage.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub output: ModelOutput,
    /// Total tokens (prompt and completion) reported by the backend.
    pub total_tokens: u64,
}

/// Trait for Large Language Model backends.
///
/// This abstraction allows swapping between different LLM providers
/// without changing the research engine.
///
/// # Example
///
/// ```ignore
/// use quarry_core::config::Config;
/// use quarry_core::llm::{ModelRequest, Provider, LLM};
///
/// let config = Config::load()?;
/// let llm = Provider::from_config(&config.llm)?.build()?;
/// let response = llm
///     .generate(&ModelRequest::text("", "You are terse.", "Hello!"))
///     .await?;
/// ```
#[async_trait]
pub trait LLM: Send + Sync {
    /// Sends one request and returns the reply with its token usage.
    ///
    /// Implementations return [`ModelOutput::Object`] exactly when the
    /// request carries a schema.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError>;
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl LLM for Box<dyn LLM> {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        (**self).generate(request).await
    }
}
