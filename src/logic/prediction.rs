//! Prediction - turn classifier output into labelled results

use std::time::Instant;

use serde::Serialize;

use crate::logic::attack_types;
use crate::logic::features::FeatureMatrix;
use crate::logic::model::{Classifier, ModelError, ModelHandle};

/// Prediction output for one row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub label: usize,
    pub attack_type: &'static str,
    /// Probability of the predicted class, percent, 2 decimals
    pub confidence: f64,
}

/// Probability → percent rounded to 2 decimals, clamped to [0, 100]
pub fn confidence_percent(probability: f32) -> f64 {
    let pct = (f64::from(probability) * 100.0).clamp(0.0, 100.0);
    (pct * 100.0).round() / 100.0
}

/// Run `predict` and `predict_proba` over every row and pair them up
pub fn predict_rows(
    classifier: &dyn Classifier,
    x: &FeatureMatrix,
) -> Result<Vec<Prediction>, ModelError> {
    let labels = classifier.predict(x)?;
    let probabilities = classifier.predict_proba(x)?;

    if labels.len() != x.rows() || probabilities.len() != x.rows() {
        return Err(ModelError::Inference(format!(
            "model returned {} labels and {} probability rows for {} inputs",
            labels.len(),
            probabilities.len(),
            x.rows()
        )));
    }

    labels
        .into_iter()
        .zip(probabilities)
        .enumerate()
        .map(|(row, (label, probs))| {
            if probs.iter().any(|p| !p.is_finite()) {
                return Err(ModelError::Inference(format!(
                    "non-finite class probabilities for row {}",
                    row + 1
                )));
            }
            let p = probs.get(label).copied().ok_or_else(|| {
                ModelError::Inference(format!(
                    "label {} outside {} class probabilities",
                    label,
                    probs.len()
                ))
            })?;
            Ok(Prediction {
                label,
                attack_type: attack_types::name(label),
                confidence: confidence_percent(p),
            })
        })
        .collect()
}

/// [`predict_rows`] with latency tracked on the handle
pub fn classify(
    handle: &ModelHandle,
    classifier: &dyn Classifier,
    x: &FeatureMatrix,
) -> Result<Vec<Prediction>, ModelError> {
    let start = Instant::now();
    let result = predict_rows(classifier, x);
    handle.record(start.elapsed());
    result
}
