//! Local HTTP server exposing the research engine.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)

mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use color_eyre::Result;
use quarry_core::{Config, ResearchRunner};
use tower_http::cors::{Any, CorsLayer};

/// Shared application state for the server.
pub struct AppState {
    pub runner: Arc<ResearchRunner>,
}

/// Configuration for the research server.
pub struct ServeConfig {
    /// Port to listen on.
    pub port: u16,
}

/// Builds the API router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/generate-questions", post(handlers::generate_questions))
        .route("/api/deep-research", post(handlers::deep_research))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the research server.
pub async fn start_server(serve: ServeConfig, config: &Config) -> Result<()> {
    let runner = ResearchRunner::from_config(config)?;
    let state = Arc::new(AppState {
        runner: Arc::new(runner),
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], serve.port));

    println!("Starting Quarry research server...");
    println!("API: http://localhost:{}/api", serve.port);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
