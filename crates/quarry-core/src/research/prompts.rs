//! Prompts and result schemas for each research phase.

use serde_json::{json, Value};

use crate::config::PLANNED_QUERY_COUNT;
use crate::llm::ResultSchema;

/// System prompt for the planning phase.
pub const PLANNING_SYSTEM_PROMPT: &str = r#"You are a senior research strategist. Given a research topic and the user's answers to clarifying questions, you design web search queries that together cover the topic.

Guidelines:
- Each query targets a distinct facet of the topic (background, current state, trade-offs, evidence).
- Prefer concrete terms that appear in authoritative sources over vague phrasing.
- Honour any scope, depth, or exclusion the user stated in the clarifications.
- Keep each query under 12 words."#;

/// System prompt for the extraction phase.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a meticulous research assistant. You read one web document and extract only what is relevant to the research topic.

Guidelines:
- Keep facts, figures, dates, names, and direct claims; drop navigation text, ads, and boilerplate.
- Preserve the author's caveats and uncertainty.
- If the document is irrelevant to the topic, say so in one sentence.
- Write the summary as dense prose of at most 300 words."#;

/// System prompt for the analysis phase.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a research lead reviewing the findings collected so far. You decide whether they are enough to write a useful, well-sourced report.

Guidelines:
- Mark the findings sufficient only when every important facet of the topic and the user's clarifications is covered by at least one credible source.
- List concrete gaps, one per bullet, when coverage is missing.
- Propose at most 3 new search queries that would close the most important gaps. Do not repeat queries already run.
- Be stricter in early iterations and more lenient as the iteration limit approaches."#;

/// System prompt for the report phase.
pub const REPORT_SYSTEM_PROMPT: &str = r#"You are an expert research writer. You turn a set of sourced findings into a comprehensive, well-structured report in Markdown.

Guidelines:
- Open with an executive summary, then organise the body by theme with headings.
- Support claims with the findings and cite their source URLs inline.
- Point out disagreements between sources and remaining open questions.
- Close with a conclusion and a list of all sources used.
- Wrap the entire report in <report></report> tags and write nothing outside them."#;

/// System prompt for clarifying questions.
pub const QUESTIONS_SYSTEM_PROMPT: &str = r#"You help users scope a research request before any searching begins. You ask short, focused clarifying questions."#;

/// Builds the planning prompt.
pub fn build_planning_prompt(topic: &str, clarifications: &str) -> String {
    let count = PLANNED_QUERY_COUNT;
    format!(
        r#"## Research Topic

<topic>{topic}</topic>

## Clarifications

<clarifications>
{clarifications}
</clarifications>

Generate exactly {count} search queries that together give comprehensive coverage of this topic."#
    )
}

/// Builds the extraction prompt for one document.
pub fn build_extraction_prompt(content: &str, topic: &str, clarifications: &str) -> String {
    format!(
        r#"## Research Topic

<topic>{topic}</topic>

## Clarifications

<clarifications>
{clarifications}
</clarifications>

## Document

<content>
{content}
</content>

Summarize the parts of this document that are relevant to the research topic."#
    )
}

/// Builds the analysis prompt.
pub fn build_analysis_prompt(
    findings: &str,
    topic: &str,
    clarifications: &str,
    current_queries: &[String],
    iteration: u32,
    max_iterations: u32,
) -> String {
    let queries = current_queries
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n");
    let findings_len = findings.chars().count();

    format!(
        r#"## Research Topic

<topic>{topic}</topic>

## Clarifications

<clarifications>
{clarifications}
</clarifications>

## Queries Run This Iteration

{queries}

## Findings So Far ({findings_len} characters)

<findings>
{findings}
</findings>

This is iteration {iteration} of {max_iterations}. Decide whether the findings are sufficient, list the gaps, and propose follow-up queries if more research is needed."#
    )
}

/// Builds the report prompt.
pub fn build_report_prompt(findings: &str, topic: &str, clarifications: &str) -> String {
    format!(
        r#"## Research Topic

<topic>{topic}</topic>

## Clarifications

<clarifications>
{clarifications}
</clarifications>

## Findings

<findings>
{findings}
</findings>

Write the final research report from these findings."#
    )
}

/// Builds the clarifying-questions prompt.
pub fn build_questions_prompt(topic: &str) -> String {
    format!(
        r#"Given the research topic <topic>{topic}</topic>, generate 3-4 focused clarifying questions that narrow the research scope. Cover:
- the specific aspects of interest
- the depth and complexity the research should reach
- the core dimensions of the topic that need exploring
- any preferred perspective or sources to exclude"#
    )
}

fn string_array(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

/// Planning: exactly three non-empty queries.
pub fn planning_schema() -> ResultSchema {
    ResultSchema::new(
        "search_plan",
        json!({
            "type": "object",
            "properties": {
                "searchQueries": {
                    "type": "array",
                    "items": { "type": "string", "minLength": 1 },
                    "minItems": PLANNED_QUERY_COUNT,
                    "maxItems": PLANNED_QUERY_COUNT,
                    "description": "Exactly 3 search queries for comprehensive research"
                }
            },
            "required": ["searchQueries"],
            "additionalProperties": false
        }),
    )
}

/// Extraction: a single summary string.
pub fn extraction_schema() -> ResultSchema {
    ResultSchema::new(
        "extraction",
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "A comprehensive summary of the content"
                }
            },
            "required": ["summary"],
            "additionalProperties": false
        }),
    )
}

/// Analysis: verdict, gaps as text or list, and follow-up queries.
pub fn analysis_schema() -> ResultSchema {
    ResultSchema::new(
        "analysis",
        json!({
            "type": "object",
            "properties": {
                "sufficient": {
                    "type": "boolean",
                    "description": "Whether the collected content is sufficient for a useful report"
                },
                "gaps": {
                    "anyOf": [
                        { "type": "string", "description": "Identified gaps as a text description" },
                        string_array("Identified gaps as a list")
                    ]
                },
                "queries": string_array("Search queries for missing information. Max 3 queries.")
            },
            "required": ["sufficient", "gaps", "queries"],
            "additionalProperties": false
        }),
    )
}

/// Clarifying questions: a list of strings.
pub fn questions_schema() -> ResultSchema {
    ResultSchema::new(
        "clarifying_questions",
        json!({
            "type": "object",
            "properties": {
                "questions": string_array("Focused clarifying questions about the topic")
            },
            "required": ["questions"],
            "additionalProperties": false
        }),
    )
}
