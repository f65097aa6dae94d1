//! Model Module - classifier backends behind one trait
//!
//! The trained model is a black box exposing `predict` and
//! `predict_proba`. Backends are swappable; the HTTP layer only sees
//! [`Classifier`] through a [`ModelHandle`].

pub mod handle;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod xgboost;

pub use handle::{InferenceStats, ModelHandle};
pub use xgboost::XgbModel;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::logic::features::FeatureMatrix;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model: {0}")]
    Parse(String),

    #[error("unsupported model: {0}")]
    Unsupported(String),

    #[error("Feature shape mismatch, expected: {expected}, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("inference failed: {0}")]
    Inference(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for classifier backends (XGBoost JSON, ONNX, ...)
pub trait Classifier: Send + Sync {
    /// Backend name reported by `/model_info`
    fn model_type(&self) -> &str;

    /// Input width the model was trained on, if the artifact records it
    fn n_features(&self) -> Option<usize>;

    fn n_classes(&self) -> usize;

    /// One probability vector per row
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f32>>, ModelError>;

    /// One label per row
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<usize>, ModelError> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|probs| argmax(probs))
            .collect())
    }
}

/// Index of the largest value; first one wins on ties, NaN never wins
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] || values[best].is_nan() {
            best = i;
        }
    }
    best
}

// ============================================================================
// MODEL FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// XGBoost `save_model` JSON
    Xgboost,
    /// ONNX graph (needs the `onnx` feature)
    Onnx,
}

impl ModelFormat {
    /// Guess from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Xgboost),
            "onnx" => Some(Self::Onnx),
            _ => None,
        }
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xgboost" | "xgb" | "json" => Ok(Self::Xgboost),
            "onnx" => Ok(Self::Onnx),
            other => Err(format!("unknown model format '{}'", other)),
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xgboost => write!(f, "xgboost"),
            Self::Onnx => write!(f, "onnx"),
        }
    }
}

// ============================================================================
// LOADED MODEL
// ============================================================================

/// Classifier plus artifact metadata
pub struct LoadedModel {
    pub classifier: Box<dyn Classifier>,
    pub path: String,
    pub format: ModelFormat,
    /// SHA-256 of the artifact bytes (hex)
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedModel {
    pub fn new(classifier: Box<dyn Classifier>, path: &str, format: ModelFormat, bytes: &[u8]) -> Self {
        Self {
            classifier,
            path: path.to_string(),
            format,
            sha256: checksum(bytes),
            loaded_at: Utc::now(),
        }
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_type", &self.classifier.model_type())
            .field("path", &self.path)
            .field("format", &self.format)
            .field("sha256", &self.sha256)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Load a model artifact from disk.
///
/// `format` overrides the extension-based guess.
pub fn load_model(path: &Path, format: Option<ModelFormat>) -> Result<LoadedModel, ModelError> {
    tracing::info!("Loading model from: {}", path.display());

    let format = format
        .or_else(|| ModelFormat::from_path(path))
        .ok_or_else(|| {
            ModelError::Unsupported(format!(
                "cannot infer model format from {}; set MODEL_FORMAT",
                path.display()
            ))
        })?;

    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let classifier: Box<dyn Classifier> = match format {
        ModelFormat::Xgboost => Box::new(XgbModel::from_json(&bytes)?),
        ModelFormat::Onnx => load_onnx(&bytes)?,
    };

    let model = LoadedModel::new(classifier, &path.display().to_string(), format, &bytes);
    tracing::info!(
        "Model loaded successfully ({}, {} classes, sha256 {})",
        model.classifier.model_type(),
        model.classifier.n_classes(),
        &model.sha256[..12]
    );
    Ok(model)
}

#[cfg(feature = "onnx")]
fn load_onnx(bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelError> {
    Ok(Box::new(onnx::OnnxModel::from_bytes(bytes)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_bytes: &[u8]) -> Result<Box<dyn Classifier>, ModelError> {
    Err(ModelError::Unsupported(
        "ONNX models need the `onnx` feature".to_string(),
    ))
}

/// Hex SHA-256 of the artifact
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
