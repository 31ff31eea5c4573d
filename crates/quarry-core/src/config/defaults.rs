//! Default values for Quarry configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default LLM provider.
pub const DEFAULT_LLM_PROVIDER: &str = "openrouter";

/// Default max tokens for LLM responses.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default per-call timeout for model requests (seconds).
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

// OpenRouter defaults
/// Default OpenRouter API URL.
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";
/// Default OpenRouter model, used when a request names no model.
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash-preview";

// OpenAI defaults
/// Default OpenAI API URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

// Ollama defaults
/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";
/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

// ============================================================================
// Per-phase Model Defaults
// ============================================================================

/// Model used to plan the initial search queries.
pub const DEFAULT_PLANNING_MODEL: &str = "google/gemini-2.5-flash-preview";

/// Model used to summarize each retrieved document.
pub const DEFAULT_EXTRACTION_MODEL: &str = "anthropic/claude-3-haiku";

/// Model used to judge whether the findings are sufficient.
pub const DEFAULT_ANALYSIS_MODEL: &str = "anthropic/claude-3-haiku";

/// Model used to write the final report.
pub const DEFAULT_REPORT_MODEL: &str = "google/gemini-2.5-flash-preview:thinking";

/// Model used to propose clarifying questions for a topic.
pub const DEFAULT_QUESTIONS_MODEL: &str = "google/gemini-2.0-flash-exp:free";

// ============================================================================
// Search Defaults
// ============================================================================

/// Default search provider.
pub const DEFAULT_SEARCH_PROVIDER: &str = "exa";

/// Default Exa API URL.
pub const DEFAULT_EXA_URL: &str = "https://api.exa.ai";

/// Maximum number of results requested per query.
pub const MAX_SEARCH_RESULTS: u32 = 3;

/// Maximum number of characters of page text kept per document.
pub const MAX_CONTENT_CHARS: u32 = 20_000;

/// Trailing publish/crawl window for search results (days).
pub const DEFAULT_SEARCH_WINDOW_DAYS: i64 = 365;

/// Domains never returned by search.
pub const DEFAULT_EXCLUDED_DOMAINS: &[&str] = &["https://www.youtube.com"];

/// Default per-call timeout for search requests (seconds).
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Research Defaults
// ============================================================================

/// Maximum number of search/extract/analyze iterations per run.
pub const MAX_ITERATIONS: u32 = 5;

/// Number of attempts made for a backend call before its failure is handled.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retries (milliseconds), doubled on every attempt.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Maximum number of follow-up queries taken from one analysis.
pub const DEFAULT_MAX_FOLLOW_UP_QUERIES: usize = 3;

/// Number of queries the planning phase must produce.
pub const PLANNED_QUERY_COUNT: usize = 3;
