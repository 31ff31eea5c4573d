use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A clarifying question and the user's answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
}

impl Clarification {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Renders clarifications as `Q:`/`A:` blocks separated by blank lines.
pub fn clarifications_text(clarifications: &[Clarification]) -> String {
    clarifications
        .iter()
        .map(|c| format!("Q: {}\nA: {}", c.question.trim(), c.answer.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A summarized extraction from one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub summary: String,
    /// URL of the document the summary was extracted from.
    pub source: String,
}

/// One document returned by a search, ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Mutable state of a single research run.
///
/// Owned by one run. Counters are atomic so concurrent branches of a
/// fan-out can record their work through a shared borrow; `findings` and
/// `processed_urls` are only touched by the orchestrator between fan-outs.
/// Every field only grows.
#[derive(Debug)]
pub struct ResearchState {
    topic: String,
    clarifications_text: String,
    findings: Vec<Finding>,
    processed_urls: HashSet<String>,
    tokens_used: AtomicU64,
    completed_steps: AtomicU64,
}

impl ResearchState {
    pub fn new(topic: impl Into<String>, clarifications: &[Clarification]) -> Self {
        Self {
            topic: topic.into(),
            clarifications_text: clarifications_text(clarifications),
            findings: Vec::new(),
            processed_urls: HashSet::new(),
            tokens_used: AtomicU64::new(0),
            completed_steps: AtomicU64::new(0),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn clarifications_text(&self) -> &str {
        &self.clarifications_text
    }

    /// Findings in discovery order.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn tokens_used(&self) -> u64 {
        self.tokens_used.load(Ordering::SeqCst)
    }

    pub fn completed_steps(&self) -> u64 {
        self.completed_steps.load(Ordering::SeqCst)
    }

    /// Records one successful model call and the tokens it consumed.
    pub fn record_model_call(&self, total_tokens: u64) {
        self.tokens_used.fetch_add(total_tokens, Ordering::SeqCst);
        self.completed_steps.fetch_add(1, Ordering::SeqCst);
    }

    /// Records one unit of work that consumed no tokens.
    pub fn record_step(&self) {
        self.completed_steps.fetch_add(1, Ordering::SeqCst);
    }

    /// True when a finding has already been extracted from `url`.
    pub fn is_processed(&self, url: &str) -> bool {
        self.processed_urls.contains(url)
    }

    /// Appends findings and marks their sources as processed.
    pub fn add_findings(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.processed_urls.insert(finding.source.clone());
            self.findings.push(finding);
        }
    }

    /// Concatenates all findings into one text blob for prompting.
    pub fn combined_findings(&self) -> String {
        combine_findings(&self.findings)
    }

    /// Consumes the state, returning its findings.
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

/// Renders findings as `<finding>` blocks separated by blank lines.
pub fn combine_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("<finding>\n{}\nSource: {}\n</finding>", f.summary, f.source))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Gaps reported by the analysis model, which may arrive as prose or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gaps {
    Text(String),
    List(Vec<String>),
}

impl Default for Gaps {
    fn default() -> Self {
        Gaps::List(Vec::new())
    }
}

impl Gaps {
    /// Normalizes the gaps into a list.
    ///
    /// Text is split on newline-prefixed `-` bullets, each entry trimmed and
    /// stripped of its bullet marker, blanks dropped. Text that yields no
    /// entries is kept whole as the only entry. Lists are returned unchanged.
    pub fn into_list(self) -> Vec<String> {
        match self {
            Gaps::List(items) => items,
            Gaps::Text(text) => normalize_gap_text(&text),
        }
    }
}

/// Newline followed by a dash, with or without a carriage return.
const BULLET_PATTERN: &str = r"\r?\n-";

fn normalize_gap_text(text: &str) -> Vec<String> {
    let bullet = match Regex::new(BULLET_PATTERN) {
        Ok(r) => r,
        Err(_) => return vec![text.trim().to_string()],
    };

    let items: Vec<String> = bullet
        .split(text)
        .map(|item| item.trim())
        .map(|item| item.strip_prefix('-').map(str::trim_start).unwrap_or(item))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return vec![text.to_string()];
    }
    items
}

/// The analysis verdict for one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sufficient: bool,
    pub gaps: Vec<String>,
    pub queries: Vec<String>,
}

impl AnalysisResult {
    /// The verdict used when analysis fails: keep nothing, propose nothing.
    pub fn fallback() -> Self {
        Self {
            sufficient: false,
            gaps: vec!["Error analyzing findings, continuing with research".to_string()],
            queries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulleted_gaps_split() {
        let gaps = Gaps::Text("- gap one\n- gap two".to_string());
        assert_eq!(gaps.into_list(), vec!["gap one", "gap two"]);
    }

    #[test]
    fn test_crlf_bullets_split() {
        let gaps = Gaps::Text("Missing:\r\n- pricing\r\n- benchmarks".to_string());
        assert_eq!(gaps.into_list(), vec!["Missing:", "pricing", "benchmarks"]);
    }

    #[test]
    fn test_plain_gap_text_wrapped() {
        let gaps = Gaps::Text("single gap text".to_string());
        assert_eq!(gaps.into_list(), vec!["single gap text"]);
    }

    #[test]
    fn test_gap_list_unchanged() {
        let list = vec![" a ".to_string(), String::new()];
        assert_eq!(Gaps::List(list.clone()).into_list(), list);
    }

    #[test]
    fn test_blank_gap_text_kept_whole() {
        assert_eq!(Gaps::Text("  \n ".to_string()).into_list(), vec!["  \n "]);
    }

    #[test]
    fn test_gaps_deserialize_either_shape() {
        let text: Gaps = serde_json::from_str("\"one gap\"").unwrap();
        assert_eq!(text, Gaps::Text("one gap".to_string()));

        let list: Gaps = serde_json::from_str("[\"x\", \"y\"]").unwrap();
        assert_eq!(list, Gaps::List(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn test_clarifications_text() {
        let text = clarifications_text(&[
            Clarification::new("Scope?", "Europe only"),
            Clarification::new("Depth?", " expert "),
        ]);
        assert_eq!(text, "Q: Scope?\nA: Europe only\n\nQ: Depth?\nA: expert");
    }

    #[test]
    fn test_state_counters_and_findings_grow() {
        let mut state = ResearchState::new("topic", &[]);
        state.record_model_call(120);
        state.record_step();
        assert_eq!(state.tokens_used(), 120);
        assert_eq!(state.completed_steps(), 2);

        state.add_findings(vec![Finding {
            summary: "s".to_string(),
            source: "https://a.example".to_string(),
        }]);
        assert!(state.is_processed("https://a.example"));
        assert_eq!(state.findings().len(), 1);
        assert!(state.combined_findings().contains("Source: https://a.example"));
    }
}
