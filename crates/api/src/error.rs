//! Request error mapping
//!
//! Two failure classes cross the HTTP boundary: the detector never came up
//! (client error, persists until restart) and a per-request processing
//! failure (server error carrying the description). Either way the caller
//! gets a structured payload and the process keeps serving.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// The detection collaborator failed to initialize
    #[error("Detection model not available")]
    DetectorUnavailable,

    /// Failure while handling one request
    #[error("{0}")]
    RequestProcessing(String),
}

/// Structured error payload
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::DetectorUnavailable => StatusCode::BAD_REQUEST,
            ApiError::RequestProcessing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<detection::DetectionError> for ApiError {
    fn from(err: detection::DetectionError) -> Self {
        ApiError::RequestProcessing(err.to_string())
    }
}
