use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::Finding;

const REPORT_OPEN: &str = "<report>";
const REPORT_CLOSE: &str = "</report>";

/// Errors that can occur while reading a generated report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Malformed report envelope: missing {0}")]
    MalformedEnvelope(&'static str),
}

/// Returns the text between `<report>` and `</report>`, trimmed.
pub fn extract_report_body(raw: &str) -> Result<&str, ReportError> {
    let start = raw
        .find(REPORT_OPEN)
        .ok_or(ReportError::MalformedEnvelope(REPORT_OPEN))?
        + REPORT_OPEN.len();
    let end = raw[start..]
        .find(REPORT_CLOSE)
        .ok_or(ReportError::MalformedEnvelope(REPORT_CLOSE))?;
    Ok(raw[start..start + end].trim())
}

/// Export format for a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Text,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Text => "txt",
        }
    }
}

/// A finished research report ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    /// The research topic
    pub topic: String,
    /// Report text, without the `<report>` envelope
    pub body: String,
    /// Source URLs in discovery order, without duplicates
    pub sources: Vec<String>,
    pub tokens_used: u64,
    pub completed_steps: u64,
}

impl ResearchReport {
    /// Builds a report from the raw model output.
    ///
    /// Output without a valid envelope is kept as-is.
    pub fn new(topic: impl Into<String>, raw_report: &str, findings: &[Finding]) -> Self {
        let body = match extract_report_body(raw_report) {
            Ok(body) => body.to_string(),
            Err(e) => {
                tracing::warn!("{}, keeping the raw report text", e);
                raw_report.trim().to_string()
            }
        };

        let mut sources: Vec<String> = Vec::new();
        for finding in findings {
            if !sources.contains(&finding.source) {
                sources.push(finding.source.clone());
            }
        }

        Self {
            topic: topic.into(),
            body,
            sources,
            tokens_used: 0,
            completed_steps: 0,
        }
    }

    /// Attaches the run's usage counters.
    pub fn with_usage(mut self, tokens_used: u64, completed_steps: u64) -> Self {
        self.tokens_used = tokens_used;
        self.completed_steps = completed_steps;
        self
    }

    /// Suggested file name, e.g. `rust-async-research-report.md`.
    pub fn file_name(&self, format: ReportFormat) -> String {
        let slug: String = self
            .topic
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let slug = if slug.is_empty() { "research".to_string() } else { slug };
        format!("{}-research-report.{}", slug, format.extension())
    }

    /// Renders the report in the given format.
    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Text => self.to_text(),
        }
    }

    /// Converts the report to markdown format.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# Research: {}\n\n", self.topic));

        md.push_str(&self.body);
        md.push_str("\n\n");

        if !self.sources.is_empty() {
            md.push_str("## Sources\n\n");
            for (i, source) in self.sources.iter().enumerate() {
                md.push_str(&format!("{}. <{}>\n", i + 1, source));
            }
            md.push('\n');
        }

        md.push_str(&format!(
            "---\n\n_{} tokens used across {} steps._\n",
            self.tokens_used, self.completed_steps
        ));

        md
    }

    /// Converts the report to plain text.
    pub fn to_text(&self) -> String {
        let mut text = String::new();

        text.push_str(&format!("Research: {}\n\n", self.topic));
        text.push_str(&self.body);
        text.push_str("\n\n");

        if !self.sources.is_empty() {
            text.push_str("Sources:\n");
            for (i, source) in self.sources.iter().enumerate() {
                text.push_str(&format!("  [{}] {}\n", i + 1, source));
            }
        }

        text
    }
}
