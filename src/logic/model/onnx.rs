//! ONNX Backend - ONNX Runtime integration
//!
//! Expects a classifier exported with a single `[N, F]` float input and a
//! `probabilities` output of shape `[N, C]` (zipmap disabled). When no
//! output carries that name the last output is used.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Value, ValueType};
use parking_lot::Mutex;

use super::{Classifier, ModelError};
use crate::logic::features::FeatureMatrix;
use crate::logic::attack_types::CLASS_COUNT;

const PROBABILITY_OUTPUT: &str = "probabilities";

/// ONNX classifier session
pub struct OnnxModel {
    /// `Session::run` needs `&mut`
    session: Mutex<Session>,
    output_name: String,
    n_features: Option<usize>,
}

impl OnnxModel {
    /// Load ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ModelError> {
        tracing::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| ModelError::Parse(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Parse(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| ModelError::Parse(format!("Load from memory error: {}", e)))?;

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == PROBABILITY_OUTPUT)
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Parse("No output defined".to_string()))?;

        let n_features = session.inputs.first().and_then(|input| match &input.input_type {
            ValueType::Tensor { shape, .. } => shape
                .iter()
                .last()
                .copied()
                .filter(|d| *d > 0)
                .map(|d| d as usize),
            _ => None,
        });

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            n_features,
        })
    }
}

impl Classifier for OnnxModel {
    fn model_type(&self) -> &str {
        "OnnxClassifier"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        CLASS_COUNT
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f32>>, ModelError> {
        if let Some(expected) = self.n_features {
            if x.width() != expected {
                return Err(ModelError::FeatureCount {
                    expected,
                    found: x.width(),
                });
            }
        }
        if x.rows() == 0 {
            return Ok(Vec::new());
        }

        let input_array = Array2::<f32>::from_shape_vec((x.rows(), x.width()), x.as_slice().to_vec())
            .map_err(|e| ModelError::Inference(format!("Array error: {}", e)))?;
        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ModelError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| ModelError::Inference("No output".to_string()))?;
        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("Extract error: {}", e)))?;
        let data = output_tensor.1;

        if data.len() % x.rows() != 0 {
            return Err(ModelError::Inference(format!(
                "{} probabilities for {} rows",
                data.len(),
                x.rows()
            )));
        }
        let classes = data.len() / x.rows();

        Ok(data.chunks(classes).map(|c| c.to_vec()).collect())
    }
}
