//! In-memory LLM and search backends for driving the research engine.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use quarry_core::config::ModelConfig;
use quarry_core::llm::{LLMError, ModelOutput, ModelRequest, ModelResponse, LLM};
use quarry_core::search::{SearchBackend, SearchDocument, SearchError, SearchRequest};
use quarry_core::{Config, ResearchEvent};
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub const PLANNING_MODEL: &str = "test/planning";
pub const EXTRACTION_MODEL: &str = "test/extraction";
pub const ANALYSIS_MODEL: &str = "test/analysis";
pub const REPORT_MODEL: &str = "test/report";
pub const QUESTIONS_MODEL: &str = "test/questions";

/// Tokens reported for every fake model call.
pub const TOKENS_PER_CALL: u64 = 10;

/// Marker that makes [`FakeLLM`] fail extraction of a document.
pub const FAIL_EXTRACTION: &str = "FAIL_EXTRACTION";

/// A config wired to the fake model ids, with a single attempt per call.
pub fn test_config(max_iterations: u32) -> Config {
    let mut config = Config::default();
    config.models = ModelConfig {
        planning: PLANNING_MODEL.to_string(),
        extraction: EXTRACTION_MODEL.to_string(),
        analysis: ANALYSIS_MODEL.to_string(),
        report: REPORT_MODEL.to_string(),
        questions: QUESTIONS_MODEL.to_string(),
    };
    config.research.max_iterations = max_iterations;
    config.research.max_retry_attempts = 1;
    config.research.retry_delay_ms = 0;
    config
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// An analysis reply asking for more research with `queries`.
pub fn insufficient(queries: &[&str]) -> Value {
    json!({ "sufficient": false, "gaps": ["more detail needed"], "queries": queries })
}

/// An analysis reply ending the research.
pub fn sufficient() -> Value {
    json!({ "sufficient": true, "gaps": [], "queries": [] })
}

/// Scripted LLM dispatching on the requested model id.
pub struct FakeLLM {
    plan: Option<Vec<String>>,
    analyses: Mutex<VecDeque<Option<Value>>>,
    report: Option<String>,
    questions: Option<Vec<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeLLM {
    pub fn new() -> Self {
        Self {
            plan: Some(strings(&["query one", "query two", "query three"])),
            analyses: Mutex::new(VecDeque::new()),
            report: Some("<report>\nThe report.\n</report>".to_string()),
            questions: Some(strings(&["Which aspect?", "How deep?"])),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_plan(mut self, queries: &[&str]) -> Self {
        self.plan = Some(strings(queries));
        self
    }

    pub fn failing_plan(mut self) -> Self {
        self.plan = None;
        self
    }

    /// Queues one analysis reply. Without queued replies analysis answers
    /// insufficient with no follow-up queries.
    pub fn with_analysis(self, reply: Value) -> Self {
        self.analyses.lock().unwrap().push_back(Some(reply));
        self
    }

    pub fn with_failing_analysis(self) -> Self {
        self.analyses.lock().unwrap().push_back(None);
        self
    }

    pub fn failing_report(mut self) -> Self {
        self.report = None;
        self
    }

    pub fn failing_questions(mut self) -> Self {
        self.questions = None;
        self
    }

    pub fn with_questions(mut self, questions: &[&str]) -> Self {
        self.questions = Some(strings(questions));
        self
    }

    /// Model ids of every call, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    /// Prompts sent to `model`, in call order.
    pub fn prompts_to(&self, model: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m.as_str() == model)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn calls_to(&self, model: &str) -> usize {
        self.calls().iter().filter(|m| m.as_str() == model).count()
    }

    fn reply(&self, request: &ModelRequest) -> Result<ModelOutput, LLMError> {
        let failed = || LLMError::RequestFailed(format!("scripted failure for {}", request.model));

        match request.model.as_str() {
            PLANNING_MODEL => {
                let plan = self.plan.clone().ok_or_else(failed)?;
                Ok(ModelOutput::Object(json!({ "searchQueries": plan })))
            }
            EXTRACTION_MODEL => {
                if request.prompt.contains(FAIL_EXTRACTION) {
                    return Err(failed());
                }
                Ok(ModelOutput::Object(json!({ "summary": "A relevant summary." })))
            }
            ANALYSIS_MODEL => {
                let next = self.analyses.lock().unwrap().pop_front();
                match next {
                    Some(Some(reply)) => Ok(ModelOutput::Object(reply)),
                    Some(None) => Err(failed()),
                    None => Ok(ModelOutput::Object(insufficient(&[]))),
                }
            }
            REPORT_MODEL => self.report.clone().map(ModelOutput::Text).ok_or_else(failed),
            QUESTIONS_MODEL => {
                let questions = self.questions.clone().ok_or_else(failed)?;
                Ok(ModelOutput::Object(json!({ "questions": questions })))
            }
            other => Err(LLMError::MissingConfig(format!("unexpected model {}", other))),
        }
    }
}

#[async_trait]
impl LLM for FakeLLM {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.model.clone(), request.prompt.clone()));
        let output = self.reply(request)?;
        Ok(ModelResponse {
            output,
            total_tokens: TOKENS_PER_CALL,
        })
    }
}

/// Search backend returning one document per query, keyed by the query.
pub struct FakeSearch {
    failing: Vec<String>,
    empty: Vec<String>,
    shared: Option<Vec<SearchDocument>>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self {
            failing: Vec::new(),
            empty: Vec::new(),
            shared: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Makes searches for `query` fail.
    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    /// Makes searches for `query` succeed with no documents.
    pub fn empty_on(mut self, query: &str) -> Self {
        self.empty.push(query.to_string());
        self
    }

    /// Every query returns these same documents.
    pub fn returning(mut self, documents: Vec<SearchDocument>) -> Self {
        self.shared = Some(documents);
        self
    }

    /// Queries received, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

pub fn document(url: &str, text: &str) -> SearchDocument {
    SearchDocument {
        title: Some(format!("Title for {}", url)),
        url: url.to_string(),
        text: Some(text.to_string()),
    }
}

pub fn url_for(query: &str) -> String {
    format!("https://example.com/{}", query.replace(' ', "-"))
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError> {
        self.queries.lock().unwrap().push(request.query.clone());

        if self.failing.contains(&request.query) {
            return Err(SearchError::RequestFailed(format!(
                "scripted failure for {}",
                request.query
            )));
        }
        if self.empty.contains(&request.query) {
            return Ok(Vec::new());
        }
        if let Some(shared) = &self.shared {
            return Ok(shared.clone());
        }
        Ok(vec![document(
            &url_for(&request.query),
            &format!("Page content about {}", request.query),
        )])
    }
}

/// Drains every event already sent on a closed channel.
pub fn drain(mut events: mpsc::UnboundedReceiver<ResearchEvent>) -> Vec<ResearchEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
