//! Service layer types

use serde::Serialize;

/// Score for one analyzed image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreReport {
    pub score: f32,
    pub inference_time_ms: u64,
}

/// Current service status
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub version: String,
    pub runtime: String,
    pub model_path: String,
    pub model_state: String,
}
