//! Inference adapter between captured form values and the loaded pipeline

use crate::error::Result;
use crate::models::pipeline::{extract_outcome, Pipeline};
use crate::schema::{FeatureSchema, Record};
use crate::types::{Prediction, PredictionRequest};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

/// Scores loan requests against an injected pipeline.
///
/// The pipeline is read-only after load, so one engine is shared by every
/// request handler.
#[derive(Clone)]
pub struct InferenceEngine {
    pipeline: Arc<dyn Pipeline>,
}

impl InferenceEngine {
    pub fn new(pipeline: Arc<dyn Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn model_name(&self) -> &str {
        self.pipeline.name()
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.pipeline.schema()
    }

    /// Validate, assemble and score one request.
    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        request.validate()?;
        self.predict_record(&request.to_record())
    }

    /// Score an already assembled record.
    ///
    /// The record is checked against the pipeline's schema first; a missing,
    /// extra or mistyped column never reaches the model.
    pub fn predict_record(&self, record: &Record) -> Result<Prediction> {
        self.pipeline.schema().validate(record)?;

        let (label, probabilities) = self.pipeline.classify(record)?;
        let (label, probability) = extract_outcome(label, &probabilities)?;

        debug!(
            model = self.pipeline.name(),
            label = label,
            probability = probability,
            "Inference complete"
        );

        Ok(Prediction::new(label, probability))
    }
}
