//! Pipeline backed by an ONNX Runtime session

use crate::error::{PredictError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::LoadedModel;
use crate::models::pipeline::Pipeline;
use crate::schema::{FeatureSchema, Record};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::Mutex;
use tracing::debug;

/// Encoded features go in as a `[1, n]` float tensor; the graph yields an
/// optional label and class probabilities.
pub struct OnnxPipeline {
    extractor: FeatureExtractor,
    /// Session runs need exclusive access
    model: Mutex<LoadedModel>,
    /// Used only when the graph exports no label
    threshold: f64,
}

fn inference_error(e: impl std::fmt::Display) -> PredictError {
    PredictError::Inference(e.to_string())
}

impl OnnxPipeline {
    pub fn new(model: LoadedModel, extractor: FeatureExtractor, threshold: f64) -> Self {
        Self {
            extractor,
            model: Mutex::new(model),
            threshold,
        }
    }

    fn run(&self, record: &Record) -> Result<(i64, Vec<f64>)> {
        let features = self.extractor.extract(record)?;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features)).map_err(inference_error)?;

        let mut guard = self
            .model
            .lock()
            .map_err(|e| inference_error(format!("Lock error: {}", e)))?;
        let model: &mut LoadedModel = &mut guard;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])
            .map_err(inference_error)?;

        let output = outputs.get(&model.proba_output).ok_or_else(|| {
            PredictError::InvalidOutput(format!("missing output `{}`", model.proba_output))
        })?;
        let probabilities = extract_probabilities(output)?;

        let label = match model.label_output.as_ref().and_then(|name| outputs.get(name)) {
            Some(value) => {
                let (_, data) = value
                    .try_extract_tensor::<i64>()
                    .map_err(inference_error)?;
                *data.first().ok_or_else(|| {
                    PredictError::InvalidOutput("empty label tensor".to_string())
                })?
            }
            None => threshold_label(&probabilities, self.threshold),
        };

        debug!(label = label, probabilities = ?probabilities, "ONNX inference complete");

        Ok((label, probabilities))
    }
}

/// Label for graphs that export probabilities only: 1 when `p1 >= threshold`.
fn threshold_label(probabilities: &[f64], threshold: f64) -> i64 {
    match probabilities.get(1) {
        Some(&p) if p >= threshold => 1,
        _ => 0,
    }
}

/// Read `[p0, p1]` from either a float tensor or a `seq(map(int64, float))`.
fn extract_probabilities(output: &ort::value::DynValue) -> Result<Vec<f64>> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return probabilities_from_tensor(&dims, data);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        let allocator = Allocator::default();
        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(inference_error)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(inference_error)?;
        let first = maps
            .first()
            .ok_or_else(|| PredictError::InvalidOutput("empty probability sequence".to_string()))?;
        let kv_pairs = first
            .try_extract_key_values::<i64, f32>()
            .map_err(inference_error)?;
        return probabilities_from_class_map(&kv_pairs);
    }

    Err(PredictError::InvalidOutput(
        "probability output is neither a tensor nor a sequence of maps".to_string(),
    ))
}

/// `[1, 1]` holds a bare positive-class score; `[1, c]` with `c >= 2` holds
/// one probability per class.
fn probabilities_from_tensor(dims: &[i64], data: &[f32]) -> Result<Vec<f64>> {
    let classes = dims.last().copied().unwrap_or(0);
    match classes {
        1 if !data.is_empty() => Ok(vec![1.0 - data[0] as f64, data[0] as f64]),
        c if c >= 2 && data.len() >= c as usize => {
            Ok(data[..c as usize].iter().map(|&v| v as f64).collect())
        }
        _ => Err(PredictError::InvalidOutput(format!(
            "unexpected probability shape {:?}",
            dims
        ))),
    }
}

/// Both class 0 and class 1 must be present; no other class id is allowed.
fn probabilities_from_class_map(pairs: &[(i64, f32)]) -> Result<Vec<f64>> {
    let mut slots: [Option<f64>; 2] = [None, None];
    for (class_id, prob) in pairs {
        match *class_id {
            0 | 1 => slots[*class_id as usize] = Some(*prob as f64),
            other => {
                return Err(PredictError::InvalidOutput(format!(
                    "unexpected class id {}",
                    other
                )))
            }
        }
    }

    match slots {
        [Some(p0), Some(p1)] => Ok(vec![p0, p1]),
        _ => Err(PredictError::InvalidOutput(format!(
            "class probabilities incomplete: {:?}",
            pairs
        ))),
    }
}

impl Pipeline for OnnxPipeline {
    fn name(&self) -> &str {
        "onnx"
    }

    fn schema(&self) -> &FeatureSchema {
        self.extractor.schema()
    }

    fn predict(&self, record: &Record) -> Result<i64> {
        self.run(record).map(|(label, _)| label)
    }

    fn predict_proba(&self, record: &Record) -> Result<Vec<f64>> {
        self.run(record).map(|(_, probabilities)| probabilities)
    }

    fn classify(&self, record: &Record) -> Result<(i64, Vec<f64>)> {
        self.run(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(shape: Vec<i64>, data: Vec<f32>) -> ort::value::DynValue {
        Tensor::from_array((shape, data)).unwrap().into_dyn()
    }

    #[test]
    fn test_two_class_tensor() {
        let value = tensor(vec![1, 2], vec![0.3, 0.7]);
        let probabilities = extract_probabilities(&value).unwrap();
        assert!((probabilities[0] - 0.3).abs() < 1e-6);
        assert!((probabilities[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_bare_score_tensor() {
        let value = tensor(vec![1, 1], vec![0.25]);
        let probabilities = extract_probabilities(&value).unwrap();
        assert_eq!(probabilities.len(), 2);
        assert!((probabilities[0] - 0.75).abs() < 1e-6);
        assert!((probabilities[1] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_unexpected_tensor_shape() {
        assert!(matches!(
            probabilities_from_tensor(&[1, 0], &[]),
            Err(PredictError::InvalidOutput(_))
        ));
        assert!(probabilities_from_tensor(&[], &[]).is_err());
        // declared two classes but only one value
        assert!(probabilities_from_tensor(&[1, 2], &[0.4]).is_err());
    }

    #[test]
    fn test_threshold_label_boundary() {
        assert_eq!(threshold_label(&[0.5, 0.5], 0.5), 1);
        assert_eq!(threshold_label(&[0.51, 0.49], 0.5), 0);
        assert_eq!(threshold_label(&[0.2, 0.8], 0.9), 0);
        assert_eq!(threshold_label(&[], 0.5), 0);
    }

    #[test]
    fn test_class_map_complete() {
        let probabilities = probabilities_from_class_map(&[(0, 0.25), (1, 0.75)]).unwrap();
        assert_eq!(probabilities, vec![0.25, 0.75]);
    }

    #[test]
    fn test_class_map_missing_class() {
        assert!(matches!(
            probabilities_from_class_map(&[(1, 0.7)]),
            Err(PredictError::InvalidOutput(_))
        ));
        assert!(probabilities_from_class_map(&[(0, 0.3)]).is_err());
        assert!(probabilities_from_class_map(&[(0, 0.3), (1, 0.5), (2, 0.2)]).is_err());
    }
}
