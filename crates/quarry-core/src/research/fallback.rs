use std::fmt::Display;

use super::activity::{ActivityStatus, ActivityTracker, ActivityType};

/// Turns a phase failure into that phase's fallback value.
///
/// Logs `error` under `context`, records an `error` activity of
/// `activity_type` and returns `fallback` unchanged. Never fails.
pub fn handle_error<T>(
    error: impl Display,
    context: &str,
    tracker: &ActivityTracker,
    activity_type: ActivityType,
    fallback: T,
) -> T {
    tracing::error!(phase = activity_type.as_str(), "{}: {}", context, error);
    tracker.add(activity_type, ActivityStatus::Error, format!("{} failed", context));
    fallback
}
