//! Configuration module

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::logic::features::schema::default_excluded;
use crate::logic::model::ModelFormat;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Trained model artifact
    pub model_path: PathBuf,

    /// Explicit model format; guessed from the extension when unset
    pub model_format: Option<ModelFormat>,

    /// Reference CSV whose header defines the feature schema
    pub schema_path: Option<PathBuf>,

    /// Non-feature columns dropped from every input
    pub excluded_columns: Vec<String>,

    /// Request body limit for uploads
    pub max_upload_bytes: usize,

    /// Keep serving (health, catalogue) when the model fails to load
    pub allow_missing_model: bool,

    pub log_format: LogFormat,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            host: lookup("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("xgboost_model.json")),

            model_format: lookup("MODEL_FORMAT").and_then(|f| f.parse().ok()),

            schema_path: lookup("SCHEMA_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            excluded_columns: lookup("EXCLUDED_COLUMNS")
                .map(|list| {
                    list.split(',')
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect()
                })
                .unwrap_or_else(default_excluded),

            max_upload_bytes: lookup("MAX_UPLOAD_MB")
                .and_then(|m| m.parse::<usize>().ok())
                .unwrap_or(50)
                * 1024
                * 1024,

            allow_missing_model: lookup("ALLOW_MISSING_MODEL")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),

            log_format: LogFormat::Pretty,

            environment: lookup("ENVIRONMENT")
                .map(|e| e.trim().to_ascii_lowercase())
                .unwrap_or_else(|| "development".to_string()),
        };

        // Production defaults to JSON logs unless LOG_FORMAT says otherwise
        config.log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            _ if config.is_production() => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        config
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
