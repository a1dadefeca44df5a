//! Web server module for the release exporter.
//!
//! Exposes the scrape endpoint and the health check.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::Scraper;
use crate::exposition;
use crate::health::HealthReporter;

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub scraper: Scraper,
    pub health: HealthReporter,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(app_state)
}

/// Scrape endpoint: one full collector run per request.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let samples = state.scraper.scrape().await;

    match exposition::encode_text(&samples) {
        Ok(body) => (
            [(header::CONTENT_TYPE, exposition::content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

/// Liveness probe backed by one HelmRelease list call.
async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    tracing::debug!("Healthcheck has been called");
    if state.health.is_healthy().await {
        "Ok".into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Healthcheck failed").into_response()
    }
}
