//! # Error Handling Middleware
//!
//! This module provides a standardized way to handle errors in the DocEase
//! API. It maps domain-specific errors to appropriate HTTP status codes and
//! JSON error responses, ensuring a consistent error handling experience
//! across the entire API.
//!
//! Validation problems surface before any write is attempted; persistence
//! failures of a mutation abort the whole flow (the dual write is
//! transactional, so there is no half-written pair to report).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docease_core::errors::AppointmentError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping.
///
/// `AppError` wraps domain-specific `AppointmentError` instances and
/// implements `IntoResponse` to convert them into HTTP responses with
/// appropriate status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub AppointmentError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            AppointmentError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppointmentError::Validation(_) => StatusCode::BAD_REQUEST,
            AppointmentError::NotFound(_) => StatusCode::NOT_FOUND,
            AppointmentError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppointmentError::Inconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppointmentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        // Combine status code and JSON body into a response
        (status, body).into_response()
    }
}

/// Allows using the `?` operator with functions that return
/// `Result<T, AppointmentError>` in handlers returning `Result<T, AppError>`.
impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        AppError(err)
    }
}

/// Wraps raw `eyre` reports from the db layer as persistence failures.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(AppointmentError::Persistence(err))
    }
}
