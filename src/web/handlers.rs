use crate::error::{PredictError, Result};
use crate::metrics::MetricsSnapshot;
use crate::types::{Prediction, PredictionRequest, PredictionResponse};
use crate::web::page::{render_page, Outcome};
use crate::web::AppState;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, warn};

/// Score on the blocking pool and record the outcome.
async fn score(state: &AppState, request: PredictionRequest) -> Result<Prediction> {
    let start = Instant::now();
    let engine = state.engine.clone();

    let result = tokio::task::spawn_blocking(move || engine.predict(&request))
        .await
        .map_err(|e| PredictError::Inference(format!("prediction task failed: {}", e)))
        .and_then(|r| r);

    match &result {
        Ok(prediction) => state.metrics.record_prediction(
            start.elapsed(),
            prediction.probability,
            prediction.is_high_risk(),
        ),
        Err(e) => {
            state.metrics.record_failure();
            match e {
                PredictError::InvalidRequest(_) | PredictError::Schema(_) => {
                    warn!(error = %e, "Prediction rejected")
                }
                _ => error!(error = %e, "Prediction failed"),
            }
        }
    }

    result
}

/// The form page with defaults
pub async fn index() -> Html<String> {
    Html(render_page(&PredictionRequest::default(), Outcome::None))
}

/// Form action: re-render the page with the result below the form
pub async fn predict_form(
    State(state): State<AppState>,
    Form(request): Form<PredictionRequest>,
) -> (StatusCode, Html<String>) {
    match score(&state, request.clone()).await {
        Ok(prediction) => (
            StatusCode::OK,
            Html(render_page(&request, Outcome::Scored(&prediction))),
        ),
        Err(e) => (
            e.status_code(),
            Html(render_page(&request, Outcome::Failed(&e.to_string()))),
        ),
    }
}

/// JSON scoring endpoint
pub async fn predict_api(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>> {
    let prediction = score(&state, request).await?;
    Ok(Json(PredictionResponse::from(&prediction)))
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub model: String,
    pub columns: Vec<crate::schema::ColumnSpec>,
}

/// Columns and option sets the loaded model accepts
pub async fn schema(State(state): State<AppState>) -> Json<SchemaResponse> {
    Json(SchemaResponse {
        model: state.engine.model_name().to_string(),
        columns: state.engine.schema().columns.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.engine.model_name().to_string(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
