use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response for the classify endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    #[serde(rename = "bestMatch")]
    pub best_match: Option<String>,
    pub ranking: Vec<String>,
    pub scores: HashMap<String, f64>,
    #[serde(rename = "processingTimeMs")]
    pub processing_time_ms: f64,
}

/// Loaded bodies of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodiesResponse {
    pub bodies: Vec<String>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub bodies: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
