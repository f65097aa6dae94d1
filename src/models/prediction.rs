//! Prediction payloads

use serde::Serialize;

use crate::logic::prediction::Prediction;

/// `/predict` response
#[derive(Debug, Serialize)]
pub struct SinglePredictionResponse {
    pub label: usize,
    pub attack_type: &'static str,
    pub confidence: f64,
    pub timestamp: String,
}

impl SinglePredictionResponse {
    pub fn new(prediction: Prediction, timestamp: String) -> Self {
        Self {
            label: prediction.label,
            attack_type: prediction.attack_type,
            confidence: prediction.confidence,
            timestamp,
        }
    }
}

/// One row of a `/predict_csv` response, numbered from 1
#[derive(Debug, Serialize)]
pub struct BatchPredictionRow {
    pub row: usize,
    pub label: usize,
    pub attack_type: &'static str,
    pub confidence: f64,
}

/// `/predict_csv` response
#[derive(Debug, Serialize)]
pub struct BatchPredictionResponse {
    pub total_predictions: usize,
    pub results: Vec<BatchPredictionRow>,
    pub timestamp: String,
}

impl BatchPredictionResponse {
    pub fn new(predictions: Vec<Prediction>, timestamp: String) -> Self {
        let results: Vec<BatchPredictionRow> = predictions
            .into_iter()
            .enumerate()
            .map(|(i, p)| BatchPredictionRow {
                row: i + 1,
                label: p.label,
                attack_type: p.attack_type,
                confidence: p.confidence,
            })
            .collect();

        Self {
            total_predictions: results.len(),
            results,
            timestamp,
        }
    }
}
