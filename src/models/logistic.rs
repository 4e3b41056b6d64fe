//! Logistic regression pipeline loaded from a JSON artifact

use crate::error::{PredictError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::pipeline::Pipeline;
use crate::schema::{FeatureSchema, Record};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Per-feature standardization applied before the linear term
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaling {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// On-disk form of a fitted logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    /// Encoded feature names, in coefficient order
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaling: Option<Scaling>,
    /// Overrides the configured decision threshold when present
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl LogisticArtifact {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model artifact {:?}", path))
    }
}

pub struct LogisticPipeline {
    extractor: FeatureExtractor,
    coefficients: Vec<f64>,
    intercept: f64,
    scaling: Option<Scaling>,
    threshold: f64,
}

impl LogisticPipeline {
    /// Build a pipeline, checking the artifact's layout against the extractor.
    pub fn new(
        artifact: LogisticArtifact,
        extractor: FeatureExtractor,
        default_threshold: f64,
    ) -> anyhow::Result<Self> {
        if artifact.features != extractor.feature_names() {
            bail!(
                "Model features {:?} do not match encoded layout {:?}",
                artifact.features,
                extractor.feature_names()
            );
        }

        let n = extractor.feature_count();
        if artifact.coefficients.len() != n {
            bail!(
                "Expected {} coefficients, artifact has {}",
                n,
                artifact.coefficients.len()
            );
        }

        if let Some(scaling) = &artifact.scaling {
            if scaling.mean.len() != n || scaling.scale.len() != n {
                bail!("Scaling vectors must have {} entries", n);
            }
            if scaling.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                bail!("Scaling factors must be finite and non-zero");
            }
        }

        let threshold = artifact.threshold.unwrap_or(default_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            bail!("Decision threshold {} outside [0, 1]", threshold);
        }

        Ok(Self {
            extractor,
            coefficients: artifact.coefficients,
            intercept: artifact.intercept,
            scaling: artifact.scaling,
            threshold,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn positive_probability(&self, record: &Record) -> Result<f64> {
        let features = self.extractor.extract(record)?;

        let mut z = self.intercept;
        for (i, (&x, &w)) in features.iter().zip(&self.coefficients).enumerate() {
            let x = match &self.scaling {
                Some(s) => (x as f64 - s.mean[i]) / s.scale[i],
                None => x as f64,
            };
            z += w * x;
        }

        let p = 1.0 / (1.0 + (-z).exp());
        if !p.is_finite() {
            return Err(PredictError::Inference(format!("non-finite logit {}", z)));
        }

        debug!(logit = z, probability = p, "Logistic score computed");
        Ok(p)
    }
}

impl Pipeline for LogisticPipeline {
    fn name(&self) -> &str {
        "logistic"
    }

    fn schema(&self) -> &FeatureSchema {
        self.extractor.schema()
    }

    fn predict(&self, record: &Record) -> Result<i64> {
        let p = self.positive_probability(record)?;
        Ok(if p >= self.threshold { 1 } else { 0 })
    }

    fn predict_proba(&self, record: &Record) -> Result<Vec<f64>> {
        let p = self.positive_probability(record)?;
        Ok(vec![1.0 - p, p])
    }

    fn classify(&self, record: &Record) -> Result<(i64, Vec<f64>)> {
        let p = self.positive_probability(record)?;
        let label = if p >= self.threshold { 1 } else { 0 };
        Ok((label, vec![1.0 - p, p]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::loan::CohortMonth;
    use crate::types::PredictionRequest;

    fn artifact(intercept: f64) -> LogisticArtifact {
        let extractor = FeatureExtractor::default();
        LogisticArtifact {
            features: extractor.feature_names().to_vec(),
            coefficients: vec![0.0; extractor.feature_count()],
            intercept,
            scaling: None,
            threshold: None,
        }
    }

    #[test]
    fn test_intercept_only_model() {
        let pipeline = LogisticPipeline::new(artifact(0.0), FeatureExtractor::default(), 0.5).unwrap();
        let record = PredictionRequest::default().to_record();

        let proba = pipeline.predict_proba(&record).unwrap();
        assert!((proba[1] - 0.5).abs() < 1e-12);
        assert_eq!(pipeline.predict(&record).unwrap(), 1);
    }

    #[test]
    fn test_one_hot_coefficient_moves_score() {
        let mut a = artifact(-2.0);
        let idx = a
            .features
            .iter()
            .position(|f| f == "COHORT_MONTH=2019-05")
            .unwrap();
        a.coefficients[idx] = 4.0;
        let pipeline = LogisticPipeline::new(a, FeatureExtractor::default(), 0.5).unwrap();

        let base = PredictionRequest::default().to_record();
        let old = PredictionRequest {
            cohort_month: CohortMonth::May2019,
            ..Default::default()
        }
        .to_record();

        assert_eq!(pipeline.predict(&base).unwrap(), 0);
        assert_eq!(pipeline.predict(&old).unwrap(), 1);
        let p = pipeline.predict_proba(&old).unwrap()[1];
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_scaling_applied() {
        let mut a = artifact(0.0);
        let n = a.features.len();
        a.coefficients[0] = 1.0;
        a.scaling = Some(Scaling {
            mean: {
                let mut m = vec![0.0; n];
                m[0] = 500_000.0;
                m
            },
            scale: vec![1.0; n],
        });
        let pipeline = LogisticPipeline::new(a, FeatureExtractor::default(), 0.5).unwrap();

        // amount equals the mean, so the logit is zero
        let p = pipeline.predict_proba(&PredictionRequest::default().to_record()).unwrap()[1];
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let mut a = artifact(0.0);
        a.features.swap(3, 4);
        assert!(LogisticPipeline::new(a, FeatureExtractor::default(), 0.5).is_err());

        let mut a = artifact(0.0);
        a.coefficients.pop();
        assert!(LogisticPipeline::new(a, FeatureExtractor::default(), 0.5).is_err());
    }

    #[test]
    fn test_artifact_threshold_overrides_default() {
        let mut a = artifact(0.0);
        a.threshold = Some(0.7);
        let pipeline = LogisticPipeline::new(a, FeatureExtractor::default(), 0.5).unwrap();
        assert_eq!(pipeline.threshold(), 0.7);
        assert_eq!(pipeline.predict(&PredictionRequest::default().to_record()).unwrap(), 0);
    }

    #[test]
    fn test_missing_column_propagates() {
        let pipeline = LogisticPipeline::new(artifact(0.0), FeatureExtractor::default(), 0.5).unwrap();
        let mut record = PredictionRequest::default().to_record();
        record.remove("INDUSTRY");
        assert!(matches!(
            pipeline.predict_proba(&record),
            Err(PredictError::Schema(_))
        ));
    }
}
