//! Inference logic
//!
//! Schema handling, feature alignment and classifier backends live here,
//! independent of the HTTP layer.

pub mod attack_types;
pub mod features;
pub mod model;
pub mod prediction;
