use serde::{Deserialize, Serialize};
use crate::models::domain::PlaceCount;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Distinct places available for a college type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesResponse {
    pub college_type: String,
    pub places: Vec<PlaceCount>,
}
