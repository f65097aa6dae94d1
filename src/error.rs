//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::logic::features::FeatureError;
use crate::logic::model::ModelError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    // Malformed request
    #[error("{0}")]
    BadRequest(String),

    // Values that cannot be coerced to features
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{0}")]
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Feature(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotLoaded | AppError::Model(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match &self {
            AppError::Model(_) | AppError::InternalError(_) => {
                tracing::error!("Request failed: {}", message)
            }
            AppError::ModelNotLoaded => tracing::error!("Prediction requested without a model"),
            AppError::BadRequest(_) | AppError::Feature(_) => {
                tracing::warn!("Rejected request: {}", message)
            }
        }

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
