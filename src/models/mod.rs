//! Persisted model loading and inference

pub mod inference;
pub mod loader;
pub mod logistic;
pub mod onnx;
pub mod pipeline;

pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use pipeline::Pipeline;
