use std::io::Write;

use quarry_core::config::{
    ConfigError, LLMConfig, DEFAULT_EXCLUDED_DOMAINS, DEFAULT_LLM_PROVIDER,
    DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENROUTER_MODEL, MAX_CONTENT_CHARS,
    MAX_ITERATIONS, MAX_SEARCH_RESULTS,
};
use quarry_core::Config;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
    assert_eq!(config.research.max_iterations, MAX_ITERATIONS);
    assert_eq!(config.search.max_results, MAX_SEARCH_RESULTS);
    assert_eq!(config.search.max_content_chars, MAX_CONTENT_CHARS);
    assert_eq!(config.search.exclude_domains, DEFAULT_EXCLUDED_DOMAINS);
    assert!(!config.research.dedupe_query_history);
}

#[test]
fn test_config_to_toml() {
    let toml_str = Config::default_config_string();
    assert!(toml_str.contains("[llm]"));
    assert!(toml_str.contains("[models]"));
    assert!(toml_str.contains("[search]"));
    assert!(toml_str.contains("[research]"));
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[llm]
provider = "ollama"
model = "llama3"

[models]
report = "custom/report-model"

[research]
max_iterations = 2
dedupe_query_history = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.llm.provider, "ollama");
    assert_eq!(config.llm.model, Some("llama3".to_string()));
    assert_eq!(config.models.report, "custom/report-model");
    assert_eq!(config.research.max_iterations, 2);
    assert!(config.research.dedupe_query_history);

    // untouched sections keep their defaults
    assert_eq!(config.search.max_results, MAX_SEARCH_RESULTS);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search]\nmax_results = 5\nwindow_days = 30").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.search.max_results, 5);
    assert_eq!(config.search.window_days, 30);
}

#[test]
fn test_from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[research]\nmax_retry_attempts = 0").unwrap();

    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_from_file_reports_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[search\nmax_results = ").unwrap();

    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_model_or_default() {
    let mut config = LLMConfig::default();
    assert_eq!(config.model_or_default(), DEFAULT_OPENROUTER_MODEL);

    config.provider = "ollama".to_string();
    assert_eq!(config.model_or_default(), DEFAULT_OLLAMA_MODEL);

    config.provider = "openai".to_string();
    assert_eq!(config.model_or_default(), DEFAULT_OPENAI_MODEL);

    config.model = Some("custom-model".to_string());
    assert_eq!(config.model_or_default(), "custom-model");
}
