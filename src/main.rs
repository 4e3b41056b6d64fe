//! Loan Default Risk Predictor - Main Entry Point
//!
//! Loads the persisted model, then serves the prediction form over HTTP.

use anyhow::{Context, Result};
use loan_default_predictor::{
    config::{AppConfig, LoggingConfig},
    models::{InferenceEngine, ModelLoader},
    web::{build_router, AppState},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("loan_default_predictor={},tower_http=info", logging.level))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config.logging)?;

    info!("Starting Loan Default Risk Predictor");
    info!(
        model_path = %config.model.path,
        format = ?config.model.format,
        decision_threshold = config.model.decision_threshold,
        "Configuration loaded successfully"
    );

    // The service cannot run without its model
    let loader = ModelLoader::with_threads(config.model.onnx_threads);
    let pipeline = match loader.load_pipeline(&config.model) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to load model");
            return Err(e);
        }
    };

    let engine = InferenceEngine::new(pipeline);
    info!(model = engine.model_name(), "Inference engine initialized");

    let state = AppState::new(engine);
    let metrics = state.metrics.clone();
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}
