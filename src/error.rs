//! Error types for scoring requests

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A record does not match the schema the model declares
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("unexpected column `{0}`")]
    UnexpectedColumn(String),

    #[error("column `{column}` expects a {expected} value, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column `{column}` has no category `{value}`")]
    UnknownCategory { column: String, value: String },

    #[error("column `{0}` must be a finite number")]
    NonFinite(String),
}

/// Failure of a single prediction attempt
#[derive(Error, Debug)]
pub enum PredictError {
    /// Request failed field validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Record rejected before reaching the model
    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),

    /// Model runtime failed
    #[error("inference failed: {0}")]
    Inference(String),

    /// Model returned something other than a binary label and two probabilities
    #[error("invalid model output: {0}")]
    InvalidOutput(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;

impl PredictError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::InvalidRequest(_) | PredictError::Schema(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::Inference(_) | PredictError::InvalidOutput(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidRequest(_) => "invalid_request",
            PredictError::Schema(_) => "schema_mismatch",
            PredictError::Inference(_) => "inference_failed",
            PredictError::InvalidOutput(_) => "invalid_output",
        }
    }
}

impl From<validator::ValidationErrors> for PredictError {
    fn from(err: validator::ValidationErrors) -> Self {
        PredictError::InvalidRequest(err.to_string())
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_converts() {
        let err: PredictError = SchemaError::MissingColumn("SEGMENT".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "schema_mismatch");
        assert_eq!(err.to_string(), "schema mismatch: missing column `SEGMENT`");
    }

    #[test]
    fn test_inference_error_is_server_error() {
        let err = PredictError::Inference("session poisoned".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
