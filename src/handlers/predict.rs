//! Prediction handlers

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use chrono::Utc;
use serde_json::{Map, Value};

use crate::logic::features::{prepare_features, FeatureFrame, FeatureInput};
use crate::logic::prediction;
use crate::models::{BatchPredictionResponse, SinglePredictionResponse};
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

/// Predict attack type for a single set of features
pub async fn predict_single(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<SinglePredictionResponse>> {
    let model = state.model.current().ok_or(AppError::ModelNotLoaded)?;

    let record = parse_record(&body)?;
    let features = prepare_features(
        FeatureInput::Record(&record),
        &state.schema,
        model.classifier.n_features(),
    )?;

    let prediction = prediction::classify(&state.model, model.classifier.as_ref(), &features)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InternalError("model returned no prediction".to_string()))?;

    let result = SinglePredictionResponse::new(prediction, Utc::now().to_rfc3339());
    tracing::info!("Single prediction result: {:?}", result);

    Ok(Json(result))
}

/// Predict attack types for an uploaded CSV file
pub async fn predict_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<BatchPredictionResponse>> {
    let model = state.model.current().ok_or(AppError::ModelNotLoaded)?;

    let multipart = multipart.map_err(|_| AppError::BadRequest("No file uploaded".to_string()))?;
    let (file_name, data) = read_upload(multipart).await?;

    tracing::info!("Received file: {} ({} bytes)", file_name, data.len());

    let text = String::from_utf8(data.to_vec())
        .map_err(|e| AppError::BadRequest(format!("Error reading CSV: {}", e)))?;
    let frame = FeatureFrame::from_csv(text.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("Error reading CSV: {}", e)))?;

    if frame.is_empty() {
        return Err(AppError::BadRequest("CSV file is empty".to_string()));
    }

    // Alignment and inference are CPU-bound; keep them off the async workers
    let schema = state.schema.clone();
    let handle = state.model.clone();
    let predictions = tokio::task::spawn_blocking(move || -> AppResult<_> {
        let features = prepare_features(
            FeatureInput::Frame(&frame),
            &schema,
            model.classifier.n_features(),
        )?;
        Ok(prediction::classify(&handle, model.classifier.as_ref(), &features)?)
    })
    .await??;

    let response = BatchPredictionResponse::new(predictions, Utc::now().to_rfc3339());
    tracing::info!("CSV prediction completed: {} predictions", response.total_predictions);

    Ok(Json(response))
}

// Helper functions

/// Body must be a non-empty JSON object
fn parse_record(body: &[u8]) -> AppResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("No data provided".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {}", e)))?;

    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(AppError::BadRequest("No data provided".to_string())),
    }
}

/// Find the `file` field and return its name and content
async fn read_upload(mut multipart: Multipart) -> AppResult<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Error reading upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(AppError::BadRequest("No file selected".to_string()));
        }
        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::BadRequest("File must be a CSV".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Error reading CSV: {}", e)))?;
        return Ok((file_name, data));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}
