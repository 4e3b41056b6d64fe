//! Model artifact loader

use crate::config::{ModelConfig, ModelFormat};
use crate::feature_extractor::FeatureExtractor;
use crate::models::logistic::{LogisticArtifact, LogisticPipeline};
use crate::models::onnx::OnnxPipeline;
use crate::models::pipeline::Pipeline;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the encoded feature tensor
    pub input_name: String,
    /// Output carrying the predicted class, if the graph exports one
    pub label_output: Option<String>,
    /// Output carrying class probabilities
    pub proba_output: String,
}

/// Loader for the persisted pipeline
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the pipeline described by `config`.
    ///
    /// Any failure here is fatal for the service: there is no fallback model.
    pub fn load_pipeline(&self, config: &ModelConfig) -> Result<Arc<dyn Pipeline>> {
        let path = Path::new(&config.path);
        if !path.is_file() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        let extractor = FeatureExtractor::default();

        let pipeline: Arc<dyn Pipeline> = match config.format {
            ModelFormat::Onnx => {
                let model = self.load_onnx(path)?;
                Arc::new(OnnxPipeline::new(model, extractor, config.decision_threshold))
            }
            ModelFormat::Logistic => {
                info!(path = %path.display(), "Loading logistic model");
                let artifact = LogisticArtifact::from_file(path)?;
                Arc::new(
                    LogisticPipeline::new(artifact, extractor, config.decision_threshold)
                        .context(format!("Incompatible model artifact {:?}", path))?,
                )
            }
        };

        info!(
            model = pipeline.name(),
            columns = pipeline.schema().columns.len(),
            "Model loaded successfully"
        );

        Ok(pipeline)
    }

    /// Load an ONNX graph from file
    pub fn load_onnx<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let proba_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().rev().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone())
            .context("Model exports no probability output")?;

        info!(
            input = %input_name,
            label = ?label_output,
            probabilities = %proba_output,
            "ONNX session ready"
        );

        Ok(LoadedModel {
            session,
            input_name,
            label_output,
            proba_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
