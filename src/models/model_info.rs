//! Model metadata payload

use std::collections::BTreeMap;

use serde::Serialize;

/// Input width, or `"Unknown"` when the artifact does not record it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureCount {
    Known(usize),
    Unknown(&'static str),
}

impl From<Option<usize>> for FeatureCount {
    fn from(count: Option<usize>) -> Self {
        match count {
            Some(n) => FeatureCount::Known(n),
            None => FeatureCount::Unknown("Unknown"),
        }
    }
}

/// `/model_info` response
#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub feature_count: FeatureCount,
    pub classes: usize,
    pub attack_types: BTreeMap<usize, &'static str>,
    pub model_path: String,
    pub model_format: String,
    pub model_sha256: String,
    pub loaded_at: String,
    pub schema_source: String,
    pub schema_columns: usize,
    pub inference_count: u64,
    pub avg_latency_ms: f64,
}
