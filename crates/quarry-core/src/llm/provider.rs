use crate::config::{
    LLMConfig, DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL,
    DEFAULT_OPENROUTER_MODEL,
};
use super::{LLMError, OpenAIClient, LLM};

/// LLM Provider configuration.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenRouter (default, routes every per-phase model id)
    OpenRouter {
        api_key: Option<String>,
        model: Option<String>,
    },
    /// OpenAI or any other OpenAI-compatible endpoint
    OpenAI {
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    },
    /// Local Ollama instance
    Ollama {
        base_url: Option<String>,
        model: String,
    },
}

impl Default for Provider {
    fn default() -> Self {
        Provider::OpenRouter {
            api_key: None,
            model: None,
        }
    }
}

impl Provider {
    /// Creates a provider from LLMConfig, resolving the key, model and
    /// base URL through the config's environment and default fallbacks.
    pub fn from_config(config: &LLMConfig) -> Result<Self, LLMError> {
        match config.provider.as_str() {
            "openrouter" => Ok(Provider::OpenRouter {
                api_key: config.api_key_or_env(),
                model: Some(config.model_or_default()),
            }),
            "openai" => Ok(Provider::OpenAI {
                base_url: Some(config.base_url_or_default()),
                api_key: config.api_key_or_env(),
                model: Some(config.model_or_default()),
            }),
            "ollama" => Ok(Provider::Ollama {
                base_url: Some(config.base_url_or_default()),
                model: config.model_or_default(),
            }),
            other => Err(LLMError::UnknownProvider(other.to_string())),
        }
    }

    /// Creates an LLM client from the provider configuration.
    pub fn build(self) -> Result<Box<dyn LLM>, LLMError> {
        self.build_with_max_tokens(DEFAULT_MAX_TOKENS)
    }

    /// Creates an LLM client with an explicit response token limit.
    pub fn build_with_max_tokens(self, max_tokens: u32) -> Result<Box<dyn LLM>, LLMError> {
        let client = match self {
            Provider::OpenRouter { api_key, model } => {
                let key = api_key.ok_or(LLMError::MissingApiKey)?;
                OpenAIClient::openrouter(
                    key,
                    model.unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                )
            }
            Provider::OpenAI {
                base_url,
                api_key,
                model,
            } => OpenAIClient::new(
                base_url.unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                api_key.unwrap_or_default(),
                model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            ),
            Provider::Ollama { base_url, model } => OpenAIClient::new(
                base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                "",
                model,
            ),
        };

        Ok(Box::new(client.with_max_tokens(max_tokens)))
    }
}
