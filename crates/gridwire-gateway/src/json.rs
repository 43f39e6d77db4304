//! JSON response types for the HTTP gateway.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Registered resource names.
    pub resources: Vec<String>,
}
