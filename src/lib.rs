//! FlowGuard Inference Server
//!
//! HTTP wrapper around a trained network-traffic attack classifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    FLOWGUARD INFERENCE                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │  API      │──▶│  Feature     │──▶│  Classifier         │  │
//! │  │  (Axum)   │   │  Alignment   │   │  (XGBoost / ONNX)   │  │
//! │  └───────────┘   └──────┬───────┘   └─────────────────────┘  │
//! │                         ▼                                    │
//! │                 ┌───────────────┐                            │
//! │                 │ Reference     │                            │
//! │                 │ Schema (CSV)  │                            │
//! │                 └───────────────┘                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod models;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};

use logic::features::FeatureSchema;
use logic::model::{LoadedModel, ModelHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub schema: Arc<FeatureSchema>,
    pub model: Arc<ModelHandle>,
}

impl AppState {
    pub fn new(config: Config, schema: FeatureSchema, model: Option<LoadedModel>) -> Self {
        let handle = match model {
            Some(model) => ModelHandle::with_model(model),
            None => ModelHandle::empty(),
        };
        Self {
            config,
            schema: Arc::new(schema),
            model: Arc::new(handle),
        }
    }

    /// State with the built-in schema and no model
    pub fn without_model(config: Config) -> Self {
        Self::new(config, FeatureSchema::cic_ids2017(), None)
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict_single))
        .route("/predict_csv", post(handlers::predict::predict_csv))
        .route("/attack_types", get(handlers::model::list_attack_types))
        .route("/model_info", get(handlers::model::info))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
