//! Error handling for the gateway.
//!
//! Grid query failures never reach this type: they are answered with a
//! failure envelope and status 200. These errors cover startup (fixture
//! loading) and the rare failure to produce a response at all.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Gateway error type.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A fixture file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fixture file or response body is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fixture file is well-formed JSON but describes no usable resource.
    #[error("invalid fixture: {0}")]
    Fixture(String),

    /// The grid engine rejected a setting or registration.
    #[error(transparent)]
    Grid(#[from] gridwire_core::Error),

    /// A blocking task failed to complete.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error flag.
    pub error: bool,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let code = match &self {
            GatewayError::Io { .. } => "IO_ERROR",
            GatewayError::Json(_) => "JSON_ERROR",
            GatewayError::Fixture(_) => "FIXTURE_ERROR",
            GatewayError::Grid(_) => "GRID_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        };

        let body = ErrorResponse {
            error: true,
            code: code.to_string(),
            message: self.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for GatewayError {
    fn from(err: tokio::task::JoinError) -> Self {
        GatewayError::Internal(err.to_string())
    }
}
