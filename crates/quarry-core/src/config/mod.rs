//! Configuration management for Quarry.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `quarry.toml` file
//! 3. User config `~/.config/quarry/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Name of the project-local configuration file.
pub const CONFIG_FILE_NAME: &str = "quarry.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration.
    pub llm: LLMConfig,

    /// Model identifiers for each research phase.
    pub models: ModelConfig,

    /// Web search configuration.
    pub search: SearchConfig,

    /// Iteration and retry limits for a research run.
    pub research: ResearchConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./quarry.toml` (project local)
    /// 2. `~/.config/quarry/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_file(CONFIG_FILE_NAME);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("quarry").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("QUARRY_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("QUARRY_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Ok(url) = std::env::var("QUARRY_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Ok(key) = std::env::var("QUARRY_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("QUARRY_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Ok(iterations) = std::env::var("QUARRY_MAX_ITERATIONS") {
            if let Ok(n) = iterations.parse() {
                self.research.max_iterations = n;
            }
        }
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        if self.search.max_content_chars == 0 {
            return Err(ConfigError::Invalid(
                "search.max_content_chars must be at least 1".to_string(),
            ));
        }
        if self.research.max_retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "research.max_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "llm.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "search.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Provider name: "openrouter", "openai" or "ollama".
    pub provider: String,

    /// Fallback model name, used when a request names no model.
    pub model: Option<String>,

    /// Base URL for the API.
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum tokens for response.
    pub max_tokens: u32,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            model: None,
            base_url: None,
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl LLMConfig {
    /// Get the model name, falling back to provider defaults.
    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider.as_str() {
            "ollama" => DEFAULT_OLLAMA_MODEL.to_string(),
            "openai" => DEFAULT_OPENAI_MODEL.to_string(),
            _ => DEFAULT_OPENROUTER_MODEL.to_string(),
        })
    }

    /// Get the base URL, falling back to OLLAMA_HOST (for Ollama) and
    /// then to provider defaults.
    pub fn base_url_or_default(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| match self.provider.as_str() {
            "ollama" => std::env::var("OLLAMA_HOST")
                .map(|host| format!("{}/v1", host.trim_end_matches('/')))
                .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            "openai" => DEFAULT_OPENAI_URL.to_string(),
            _ => DEFAULT_OPENROUTER_URL.to_string(),
        })
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("QUARRY_LLM_API_KEY").ok())
            .or_else(|| match self.provider.as_str() {
                "openai" => std::env::var("OPENAI_API_KEY").ok(),
                "ollama" => None,
                _ => std::env::var("OPENROUTER_API_KEY").ok(),
            })
    }

    /// Per-call timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Model identifiers for each research phase.
///
/// Phases may use models of different cost and capability tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub planning: String,
    pub extraction: String,
    pub analysis: String,
    pub report: String,
    pub questions: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            planning: DEFAULT_PLANNING_MODEL.to_string(),
            extraction: DEFAULT_EXTRACTION_MODEL.to_string(),
            analysis: DEFAULT_ANALYSIS_MODEL.to_string(),
            report: DEFAULT_REPORT_MODEL.to_string(),
            questions: DEFAULT_QUESTIONS_MODEL.to_string(),
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search provider name. Only "exa" is supported.
    pub provider: String,

    /// Base URL for the search API.
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum number of results per query.
    pub max_results: u32,

    /// Maximum characters of page text kept per document.
    pub max_content_chars: u32,

    /// Trailing publish/crawl window in days.
    pub window_days: i64,

    /// Domains excluded from every search.
    pub exclude_domains: Vec<String>,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_SEARCH_PROVIDER.to_string(),
            base_url: None,
            api_key: None,
            max_results: MAX_SEARCH_RESULTS,
            max_content_chars: MAX_CONTENT_CHARS,
            window_days: DEFAULT_SEARCH_WINDOW_DAYS,
            exclude_domains: DEFAULT_EXCLUDED_DOMAINS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
        }
    }
}

impl SearchConfig {
    /// Get the base URL, falling back to the provider default.
    pub fn base_url_or_default(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| DEFAULT_EXA_URL.to_string())
    }

    /// Get API key from config or environment.
    pub fn api_key_or_env(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("QUARRY_SEARCH_API_KEY").ok())
            .or_else(|| std::env::var("EXA_API_KEY").ok())
    }

    /// Per-call timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Research loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Maximum number of search/extract/analyze iterations.
    pub max_iterations: u32,

    /// Attempts per backend call before the failure is handled.
    pub max_retry_attempts: u32,

    /// Base delay between retries in milliseconds.
    pub retry_delay_ms: u64,

    /// Maximum number of follow-up queries taken from one analysis.
    pub max_follow_up_queries: usize,

    /// Drop follow-up queries already issued in any earlier iteration,
    /// not only in the current one.
    pub dedupe_query_history: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            retry_delay_ms: RETRY_DELAY_MS,
            max_follow_up_queries: DEFAULT_MAX_FOLLOW_UP_QUERIES,
            dedupe_query_history: false,
        }
    }
}

impl ResearchConfig {
    /// Base delay between retries as a duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
