//! Terminal rendering of a research run's event stream.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use quarry_core::research::{ActivityStatus, ResearchEvent};
use tokio::sync::mpsc::UnboundedReceiver;

/// A steadily ticking spinner with `message`.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders activities until the stream closes.
///
/// Pending activities drive the spinner; finished ones are printed as a
/// permanent log line above it.
pub async fn render_events(mut events: UnboundedReceiver<ResearchEvent>) {
    let pb = spinner("Starting research");

    while let Some(event) = events.recv().await {
        match event {
            ResearchEvent::Activity(activity) => {
                let line = format!("[{}] {}", activity.kind.as_str(), activity.message);
                match activity.status {
                    ActivityStatus::Pending => pb.set_message(line),
                    status => pb.println(format!("{} {}", status.icon(), line)),
                }
            }
            ResearchEvent::Report(_) => pb.set_message("Report ready"),
        }
    }

    pb.finish_and_clear();
}
