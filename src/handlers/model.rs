//! Catalogue and model metadata handlers

use std::collections::BTreeMap;

use axum::{extract::State, Json};

use crate::logic::attack_types;
use crate::models::ModelInfoResponse;
use crate::{AppError, AppResult, AppState};

/// All attack types the model can report
pub async fn list_attack_types() -> Json<BTreeMap<usize, &'static str>> {
    Json(attack_types::catalogue())
}

/// Information about the loaded model
pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfoResponse>> {
    let model = state.model.current().ok_or(AppError::ModelNotLoaded)?;
    let stats = state.model.stats();

    Ok(Json(ModelInfoResponse {
        model_type: model.classifier.model_type().to_string(),
        feature_count: model.classifier.n_features().into(),
        classes: attack_types::CLASS_COUNT,
        attack_types: attack_types::catalogue(),
        model_path: model.path.clone(),
        model_format: model.format.to_string(),
        model_sha256: model.sha256.clone(),
        loaded_at: model.loaded_at.to_rfc3339(),
        schema_source: state.schema.source().to_string(),
        schema_columns: state.schema.len(),
        inference_count: stats.inference_count,
        avg_latency_ms: stats.avg_latency_ms,
    }))
}
