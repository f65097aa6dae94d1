//! Model Handle - shared model slot and inference counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

use super::LoadedModel;

/// Latency stats
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct InferenceStats {
    pub inference_count: u64,
    pub avg_latency_ms: f64,
}

/// The model currently served.
///
/// Readers clone the `Arc` and release the lock before running inference.
#[derive(Debug, Default)]
pub struct ModelHandle {
    slot: RwLock<Option<Arc<LoadedModel>>>,
    inference_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

impl ModelHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(model: LoadedModel) -> Self {
        let handle = Self::default();
        handle.install(model);
        handle
    }

    /// Replace the served model
    fn install(&self, model: LoadedModel) {
        *self.slot.write() = Some(Arc::new(model));
    }

    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.slot.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Track one inference call (a batch counts once)
    pub fn record(&self, elapsed: Duration) {
        self.latency_sum_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> InferenceStats {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 {
            (sum as f64 / count as f64) / 1000.0
        } else {
            0.0
        };

        InferenceStats {
            inference_count: count,
            avg_latency_ms: avg,
        }
    }
}
