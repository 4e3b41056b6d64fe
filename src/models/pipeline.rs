//! The capability a persisted model exposes to the rest of the service

use crate::error::{PredictError, Result};
use crate::schema::{FeatureSchema, Record};

/// A pre-fitted transformation-plus-classifier.
///
/// Implementations take one record and return the binary class and the
/// class probability vector `[p0, p1]`.
pub trait Pipeline: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Columns the pipeline expects, checked before every call
    fn schema(&self) -> &FeatureSchema;

    /// Predicted class label for a single record
    fn predict(&self, record: &Record) -> Result<i64>;

    /// Class probabilities for a single record
    fn predict_proba(&self, record: &Record) -> Result<Vec<f64>>;

    /// Label and probabilities together.
    ///
    /// Runtimes that produce both from one forward pass should override this.
    fn classify(&self, record: &Record) -> Result<(i64, Vec<f64>)> {
        Ok((self.predict(record)?, self.predict_proba(record)?))
    }
}

/// Check a raw model output and pull out the label and positive-class probability.
pub fn extract_outcome(label: i64, probabilities: &[f64]) -> Result<(u8, f64)> {
    let label = match label {
        0 => 0u8,
        1 => 1u8,
        other => {
            return Err(PredictError::InvalidOutput(format!(
                "label {} is not a binary class",
                other
            )))
        }
    };

    if probabilities.len() != 2 {
        return Err(PredictError::InvalidOutput(format!(
            "expected 2 class probabilities, got {}",
            probabilities.len()
        )));
    }

    if let Some(p) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(PredictError::InvalidOutput(format!(
            "probability {} outside [0, 1]",
            p
        )));
    }

    Ok((label, probabilities[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_outcome() {
        assert_eq!(extract_outcome(1, &[0.266, 0.734]).unwrap(), (1, 0.734));
        assert_eq!(extract_outcome(0, &[0.9, 0.1]).unwrap(), (0, 0.1));
    }

    #[test]
    fn test_non_binary_label() {
        assert!(matches!(
            extract_outcome(2, &[0.5, 0.5]),
            Err(PredictError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_wrong_probability_shape() {
        assert!(extract_outcome(0, &[1.0]).is_err());
        assert!(extract_outcome(0, &[0.2, 0.3, 0.5]).is_err());
        assert!(extract_outcome(0, &[-0.1, 1.1]).is_err());
        assert!(extract_outcome(0, &[f64::NAN, 0.5]).is_err());
    }
}
