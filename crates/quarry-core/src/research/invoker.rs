use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::retry::RetryPolicy;
use super::state::ResearchState;
use crate::llm::{LLMError, ModelOutput, ModelRequest, ModelResponse, LLM};

/// Uniform entry point for model calls made during a research run.
///
/// Each successful call adds its token usage to the run state and counts
/// as one completed step. Failures are returned to the caller, which picks
/// its own fallback; transient failures are retried first.
#[derive(Clone)]
pub struct ModelInvoker {
    llm: Arc<dyn LLM>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ModelInvoker {
    pub fn new(llm: Arc<dyn LLM>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            llm,
            retry,
            timeout,
        }
    }

    /// Calls the model and records the usage in `state`.
    pub async fn call_model(
        &self,
        request: &ModelRequest,
        state: &ResearchState,
    ) -> Result<ModelOutput, LLMError> {
        let response = self.call_untracked(request).await?;
        state.record_model_call(response.total_tokens);
        tracing::debug!(
            model = %request.model,
            tokens = response.total_tokens,
            total = state.tokens_used(),
            "model call complete"
        );
        Ok(response.output)
    }

    /// Calls the model with a schema and deserializes the object into `T`.
    pub async fn call_object<T: DeserializeOwned>(
        &self,
        request: &ModelRequest,
        state: &ResearchState,
    ) -> Result<T, LLMError> {
        match self.call_model(request, state).await? {
            ModelOutput::Object(value) => {
                serde_json::from_value(value).map_err(|e| LLMError::SchemaViolation(e.to_string()))
            }
            ModelOutput::Text(_) => Err(LLMError::SchemaViolation(
                "expected a structured object, got free-form text".to_string(),
            )),
        }
    }

    /// Calls the model without a schema and returns its text.
    pub async fn call_text(
        &self,
        request: &ModelRequest,
        state: &ResearchState,
    ) -> Result<String, LLMError> {
        match self.call_model(request, state).await? {
            ModelOutput::Text(text) => Ok(text),
            ModelOutput::Object(value) => Ok(value.to_string()),
        }
    }

    /// Calls the model without touching any run state.
    pub async fn call_untracked(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        let label = format!("model call to {}", request.model);
        self.retry.run(&label, || self.attempt(request)).await
    }

    async fn attempt(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        match tokio::time::timeout(self.timeout, self.llm.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LLMError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingLLM {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LLM for CountingLLM {
        async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                return Err(LLMError::RateLimited);
            }
            let output = match request.schema {
                Some(_) => ModelOutput::Object(json!({"summary": "ok"})),
                None => ModelOutput::Text("plain".to_string()),
            };
            Ok(ModelResponse {
                output,
                total_tokens: 40,
            })
        }
    }

    struct SlowLLM;

    #[async_trait]
    impl LLM for SlowLLM {
        async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse, LLMError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ModelResponse {
                output: ModelOutput::Text(String::new()),
                total_tokens: 0,
            })
        }
    }

    #[derive(Deserialize)]
    struct Summary {
        summary: String,
    }

    fn invoker(llm: impl LLM + 'static, attempts: u32) -> ModelInvoker {
        let retry = RetryPolicy {
            max_attempts: attempts,
            base_delay: Duration::from_millis(1),
        };
        ModelInvoker::new(Arc::new(llm), retry, Duration::from_secs(1))
    }

    fn structured() -> ModelRequest {
        ModelRequest::object(
            "m",
            "sys",
            "prompt",
            crate::llm::ResultSchema::new("summary", json!({"type": "object"})),
        )
    }

    #[tokio::test]
    async fn test_usage_recorded_once_per_call() {
        let state = ResearchState::new("topic", &[]);
        let invoker = invoker(
            CountingLLM {
                failures_before_success: 0,
                calls: AtomicU32::new(0),
            },
            1,
        );

        let summary: Summary = invoker.call_object(&structured(), &state).await.unwrap();
        let text = invoker
            .call_text(&ModelRequest::text("m", "sys", "prompt"), &state)
            .await
            .unwrap();

        assert_eq!(summary.summary, "ok");
        assert_eq!(text, "plain");
        assert_eq!(state.tokens_used(), 80);
        assert_eq!(state.completed_steps(), 2);
    }

    #[tokio::test]
    async fn test_retries_do_not_double_count() {
        let state = ResearchState::new("topic", &[]);
        let invoker = invoker(
            CountingLLM {
                failures_before_success: 2,
                calls: AtomicU32::new(0),
            },
            3,
        );

        let output = invoker.call_model(&structured(), &state).await.unwrap();
        assert!(matches!(output, ModelOutput::Object(_)));
        assert_eq!(state.completed_steps(), 1);
        assert_eq!(state.tokens_used(), 40);
    }

    #[tokio::test]
    async fn test_failure_propagates_without_counting() {
        let state = ResearchState::new("topic", &[]);
        let invoker = invoker(
            CountingLLM {
                failures_before_success: 10,
                calls: AtomicU32::new(0),
            },
            2,
        );

        let result = invoker.call_model(&structured(), &state).await;
        assert!(matches!(result, Err(LLMError::RateLimited)));
        assert_eq!(state.completed_steps(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let state = ResearchState::new("topic", &[]);
        let invoker = ModelInvoker::new(
            Arc::new(SlowLLM),
            RetryPolicy::none(),
            Duration::from_millis(20),
        );

        let result = invoker
            .call_model(&ModelRequest::text("m", "s", "p"), &state)
            .await;
        assert!(matches!(result, Err(LLMError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_text_where_object_expected() {
        let state = ResearchState::new("topic", &[]);
        let invoker = invoker(
            CountingLLM {
                failures_before_success: 0,
                calls: AtomicU32::new(0),
            },
            1,
        );

        let result: Result<Summary, _> = invoker
            .call_object(&ModelRequest::text("m", "s", "p"), &state)
            .await;
        assert!(matches!(result, Err(LLMError::SchemaViolation(_))));
    }
}
