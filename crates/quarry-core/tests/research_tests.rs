use quarry_core::research::{
    clarifications_text, combine_findings, extract_report_body, Activity, ActivityStatus,
    ActivityType, Clarification, Finding, Gaps, ReportError, ReportFormat,
};
use quarry_core::{ResearchEvent, ResearchReport};
use serde_json::json;

fn finding(summary: &str, source: &str) -> Finding {
    Finding {
        summary: summary.to_string(),
        source: source.to_string(),
    }
}

mod gaps {
    use super::*;

    fn parse(value: serde_json::Value) -> Vec<String> {
        serde_json::from_value::<Gaps>(value).unwrap().into_list()
    }

    #[test]
    fn test_bulleted_text_split() {
        let gaps = parse(json!("Missing data:\n- pricing\n- benchmarks\r\n- adoption"));
        assert_eq!(gaps, vec!["Missing data:", "pricing", "benchmarks", "adoption"]);
    }

    #[test]
    fn test_plain_text_kept_whole() {
        let gaps = parse(json!("  No coverage of recent releases  "));
        assert_eq!(gaps, vec!["No coverage of recent releases"]);
    }

    #[test]
    fn test_list_passes_through() {
        let gaps = parse(json!(["one", "two"]));
        assert_eq!(gaps, vec!["one", "two"]);
    }

    #[test]
    fn test_blank_text_kept_whole() {
        assert_eq!(parse(json!("   ")), vec!["   "]);
    }
}

mod report {
    use super::*;

    #[test]
    fn test_envelope_body_extracted() {
        let raw = "preamble <report>\n## Summary\nText\n</report>";
        assert_eq!(extract_report_body(raw), Ok("## Summary\nText"));
    }

    #[test]
    fn test_malformed_envelope() {
        assert_eq!(
            extract_report_body("just prose"),
            Err(ReportError::MalformedEnvelope("<report>"))
        );
    }

    #[test]
    fn test_report_to_markdown() {
        let findings = vec![
            finding("a", "https://a.example"),
            finding("b", "https://b.example"),
            finding("c", "https://a.example"),
        ];
        let report = ResearchReport::new("Test Topic", "<report>Body text</report>", &findings)
            .with_usage(120, 7);

        let markdown = report.to_markdown();

        assert!(markdown.contains("# Research: Test Topic"));
        assert!(markdown.contains("Body text"));
        assert!(!markdown.contains("<report>"));
        assert!(markdown.contains("1. <https://a.example>"));
        assert!(markdown.contains("2. <https://b.example>"));
        assert!(!markdown.contains("3. "));
        assert!(markdown.contains("120 tokens used across 7 steps"));
    }

    #[test]
    fn test_unwrapped_report_kept() {
        let report = ResearchReport::new("Topic", "Error generating report. Please try again.", &[]);
        assert_eq!(report.body, "Error generating report. Please try again.");
        assert!(report.render(ReportFormat::Text).contains("Research: Topic"));
    }
}

mod text {
    use super::*;

    #[test]
    fn test_findings_blob() {
        let blob = combine_findings(&[
            finding("first summary", "https://one.example"),
            finding("second summary", "https://two.example"),
        ]);
        assert_eq!(
            blob,
            "<finding>\nfirst summary\nSource: https://one.example\n</finding>\n\n\
             <finding>\nsecond summary\nSource: https://two.example\n</finding>"
        );
    }

    #[test]
    fn test_clarifications_text() {
        let text = clarifications_text(&[
            Clarification::new("Scope?", "Only servers"),
            Clarification::new("Depth?", "Introductory"),
        ]);
        assert_eq!(text, "Q: Scope?\nA: Only servers\n\nQ: Depth?\nA: Introductory");
    }

    #[test]
    fn test_no_clarifications() {
        assert_eq!(clarifications_text(&[]), "");
    }
}

mod wire {
    use super::*;

    #[test]
    fn test_activity_event_shape() {
        let event = ResearchEvent::Activity(Activity {
            kind: ActivityType::Search,
            status: ActivityStatus::Complete,
            message: "Found 3 results for rust".to_string(),
            timestamp: chrono::Utc::now(),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "activity");
        assert_eq!(value["content"]["type"], "search");
        assert_eq!(value["content"]["status"], "complete");
        assert_eq!(value["content"]["message"], "Found 3 results for rust");
    }

    #[test]
    fn test_report_event_shape() {
        let value = serde_json::to_value(ResearchEvent::Report("done".to_string())).unwrap();
        assert_eq!(value, json!({ "type": "report", "content": "done" }));
    }
}
