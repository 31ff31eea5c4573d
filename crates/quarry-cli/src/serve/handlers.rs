//! HTTP route handlers for the research server.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use quarry_core::ResearchEvent;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};

use super::models::{
    DeepResearchRequest, ErrorResponse, HealthResponse, QuestionsRequest, QuestionsResponse,
};
use super::AppState;

/// GET `/api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST `/api/generate-questions` - clarifying questions for `{topic}`.
pub async fn generate_questions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let topic = request.topic.trim();
    if topic.is_empty() {
        return bad_request("topic must not be empty");
    }

    let questions = state.runner.generate_questions(topic).await;
    Json(QuestionsResponse { questions }).into_response()
}

/// POST `/api/deep-research` - runs the research loop for
/// `{topic, clarifications}` and streams every event as an SSE message.
///
/// The run continues in the background if the client disconnects.
pub async fn deep_research(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeepResearchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let topic = request.topic.trim().to_string();
    if topic.is_empty() {
        return bad_request("topic must not be empty");
    }

    let (sink, events) = mpsc::unbounded_channel();
    let runner = Arc::clone(&state.runner);
    tokio::spawn(async move {
        let outcome = runner.run(&topic, &request.clarifications, sink).await;
        tracing::info!(
            topic = %topic,
            iterations = outcome.iterations,
            tokens = outcome.tokens_used,
            "streamed research run finished"
        );
    });

    Sse::new(event_stream(events))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn event_stream(
    events: mpsc::UnboundedReceiver<ResearchEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    UnboundedReceiverStream::new(events).filter_map(|event| match Event::default().json_data(&event) {
        Ok(message) => Some(Ok(message)),
        Err(e) => {
            tracing::warn!("dropping unserializable research event: {}", e);
            None
        }
    })
}

fn bad_request(error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response()
}
