use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LLMError, ModelOutput, ModelRequest, ModelResponse, ResultSchema, LLM};
use crate::config::{
    DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_URL, DEFAULT_OPENROUTER_URL,
};

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that implements the OpenAI chat completions API
/// and its `json_schema` response format:
/// - OpenRouter
/// - OpenAI
/// - Ollama (http://localhost:11434/v1)
/// - vLLM
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    default_model: String,
    max_tokens: u32,
    client: Client,
}

impl OpenAIClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., "https://openrouter.ai/api/v1")
    /// * `api_key` - The API key (can be empty for local providers like Ollama)
    /// * `default_model` - Model used when a request names none
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_model: default_model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: Client::new(),
        }
    }

    /// Creates a client for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENROUTER_URL, api_key, default_model)
    }

    /// Creates a client for OpenAI.
    pub fn openai(api_key: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OPENAI_URL, api_key, default_model)
    }

    /// Creates a client for Ollama (local).
    pub fn ollama(default_model: impl Into<String>) -> Self {
        Self::new(DEFAULT_OLLAMA_URL, "", default_model)
    }

    /// Sets the maximum tokens for responses.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, request: &ModelRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        ChatRequest {
            model,
            messages,
            max_tokens: Some(self.max_tokens),
            response_format: request.schema.as_ref().map(ResponseFormat::from_schema),
        }
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<ChatResponse, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json");

        // Only add authorization if api_key is not empty
        if !self.api_key.is_empty() {
            req = req.header("authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.json(request).send().await?;

        let status = response.status();

        if status == 429 {
            return Err(LLMError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        let chat_request = self.build_request(request);
        let chat_response = self.send_request(&chat_request).await?;
        into_model_response(chat_response, request.schema.is_some())
    }
}

/// Converts a chat completion into a [`ModelResponse`].
fn into_model_response(
    response: ChatResponse,
    structured: bool,
) -> Result<ModelResponse, LLMError> {
    let total_tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);

    let content = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| LLMError::ParseError("response contained no choices".to_string()))?;

    let output = if structured {
        let json_str = extract_json(&content);
        let value: Value = serde_json::from_str(json_str).map_err(|e| {
            LLMError::SchemaViolation(format!(
                "{}. Response: {}",
                e,
                json_str.chars().take(500).collect::<String>()
            ))
        })?;
        if !value.is_object() {
            return Err(LLMError::SchemaViolation(
                "expected a JSON object".to_string(),
            ));
        }
        ModelOutput::Object(value)
    } else {
        ModelOutput::Text(content)
    };

    Ok(ModelResponse {
        output,
        total_tokens,
    })
}

/// Extracts JSON from a response that might be wrapped in markdown code blocks.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        if let Some(start) = trimmed.find('\n') {
            let rest = &trimmed[start + 1..];
            if let Some(end) = rest.rfind("```") {
                return rest[..end].trim();
            }
        }
    }

    trimmed
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: Value,
}

impl ResponseFormat {
    fn from_schema(schema: &ResultSchema) -> Self {
        Self {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: schema.name.clone(),
                strict: true,
                schema: schema.schema.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}
