//! FlowGuard Inference Server - entry point

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowguard_inference::config::{Config, LogFormat};
use flowguard_inference::logic::features::FeatureSchema;
use flowguard_inference::logic::model;
use flowguard_inference::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    init_tracing(&config);

    tracing::info!("FlowGuard Inference Server starting ({})...", config.environment);

    let schema = match &config.schema_path {
        Some(path) => FeatureSchema::from_reference_csv(path, &config.excluded_columns)
            .with_context(|| format!("Failed to load feature schema from {}", path.display()))?,
        None => {
            tracing::info!("SCHEMA_PATH not set, using built-in CIC-IDS2017 schema");
            FeatureSchema::cic_ids2017()
        }
    };

    let loaded = match model::load_model(&config.model_path, config.model_format) {
        Ok(m) => Some(m),
        Err(e) if config.allow_missing_model => {
            tracing::error!("Error loading model: {} (serving without a model)", e);
            None
        }
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            return Err(anyhow::Error::new(e).context("Failed to load model. Exiting..."));
        }
    };

    if let Some(m) = &loaded {
        if let Some(width) = m.classifier.n_features() {
            if width != schema.len() && width != schema.len() + 1 {
                tracing::warn!(
                    "Model expects {} features but schema has {}; predictions will fail",
                    width,
                    schema.len()
                );
            }
        }
    }

    let state = AppState::new(config.clone(), schema, loaded);
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let default_filter = if config.is_production() {
        "flowguard_inference=info,tower_http=info"
    } else {
        "flowguard_inference=debug,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
