//! Loan Default Risk Predictor Library
//!
//! Loads a pre-trained loan default classifier once at startup and scores
//! loan attributes entered on a single-page form.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{PredictError, SchemaError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use models::loader::ModelLoader;
pub use schema::{FeatureSchema, Record};
pub use types::{Prediction, PredictionRequest};
