//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
///
/// Auth failures short-circuit in the middleware before any handler runs;
/// everything else is raised by the handlers themselves. Internal detail
/// goes to the logs, never into the response body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, tampered, or expired token
    #[error("Unauthorized")]
    Unauthenticated,

    /// Authenticated but lacking permission on the specific resource
    #[error("Not permitted")]
    NotAuthorized,

    /// Referenced entity absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Offer status mutation on a non-pending offer
    #[error("Offer is already {0}")]
    InvalidTransition(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotAuthorized => (StatusCode::FORBIDDEN, "Not permitted".to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::InvalidTransition(current) => (
                StatusCode::CONFLICT,
                format!("Offer is already {}", current),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
