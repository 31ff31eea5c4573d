//! Progress reporting for a research run.
//!
//! Every activity is forwarded to the caller's event sink the moment it is
//! recorded, in call order. The final report travels through the same sink.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The phase an activity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Planning,
    Search,
    Extract,
    Analyze,
    Generate,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Planning => "planning",
            ActivityType::Search => "search",
            ActivityType::Extract => "extract",
            ActivityType::Analyze => "analyze",
            ActivityType::Generate => "generate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Complete,
    Error,
}

impl ActivityStatus {
    /// Returns the status icon for terminal display.
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityStatus::Pending => "…",
            ActivityStatus::Complete => "✓",
            ActivityStatus::Error => "✗",
        }
    }
}

/// One immutable progress-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub status: ActivityStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// An event delivered to the consumer of a research run.
///
/// Serializes as `{"type": "activity", "content": {...}}` or
/// `{"type": "report", "content": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ResearchEvent {
    Activity(Activity),
    Report(String),
}

/// Push-style channel the engine emits [`ResearchEvent`]s into.
pub type EventSink = mpsc::UnboundedSender<ResearchEvent>;

/// Append-only activity log bound to one run's event sink.
///
/// Shared by reference between concurrent branches of a run.
pub struct ActivityTracker {
    sink: EventSink,
    history: Mutex<Vec<Activity>>,
}

impl ActivityTracker {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Records one activity and forwards it to the sink.
    pub fn add(&self, kind: ActivityType, status: ActivityStatus, message: impl Into<String>) {
        let activity = Activity {
            kind,
            status,
            message: message.into(),
            timestamp: Utc::now(),
        };

        // The lock spans the send so delivery order matches history order.
        let mut history = match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A dropped receiver only means nobody is watching.
        let _ = self.sink.send(ResearchEvent::Activity(activity.clone()));
        history.push(activity);
    }

    /// Emits the final report.
    pub fn report(&self, report: impl Into<String>) {
        let _ = self.sink.send(ResearchEvent::Report(report.into()));
    }

    /// Consumes the tracker, returning every activity in emission order.
    pub fn into_history(self) -> Vec<Activity> {
        match self.history.into_inner() {
            Ok(history) => history,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
