//! HTTP surface: the form page, a JSON API, health and counters

pub mod handlers;
pub mod page;

use crate::metrics::PredictionMetrics;
use crate::models::InferenceEngine;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: InferenceEngine,
    pub metrics: Arc<PredictionMetrics>,
}

impl AppState {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine,
            metrics: Arc::new(PredictionMetrics::new()),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/api/v1/predict", post(handlers::predict_api))
        .route("/api/v1/schema", get(handlers::schema))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
