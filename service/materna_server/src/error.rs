//! Closed error taxonomy for the HTTP surface.
//!
//! Every failure a handler can produce maps to one of five stable codes;
//! internal diagnostic detail goes to the log, never to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Model or encoder not available")]
    Unavailable,
    #[error("Missing input fields")]
    MissingFields,
    #[error("Invalid numeric value for field {0}")]
    InvalidValue(&'static str),
    #[error("Prediction failed")]
    ComputationFailed,
    #[error("Database write failed")]
    DbWrite,
    #[error("Database fetch failed")]
    DbFetch,
    #[error("No records found")]
    NotFound,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unavailable => "unavailable",
            ApiError::MissingFields | ApiError::InvalidValue(_) => "invalid_input",
            ApiError::ComputationFailed => "computation_failed",
            ApiError::DbWrite | ApiError::DbFetch => "persistence_failed",
            ApiError::NotFound => "not_found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields | ApiError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unavailable
            | ApiError::ComputationFailed
            | ApiError::DbWrite
            | ApiError::DbFetch => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status(), Json(body)).into_response()
    }
}
