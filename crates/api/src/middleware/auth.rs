//! # Session Extraction
//!
//! Authentication itself is owned by the external identity provider; by
//! the time a request reaches this service, the fronting identity layer
//! has verified the user and forwards their identity in trusted headers.
//! This module only reads that identity — the one thing the core ever
//! consumes from the authentication stack.
//!
//! - `x-user-id`: the stable user identifier (UUID, required)
//! - `x-user-name`: the display name (optional; defaults to "Patient",
//!   matching what the booking screens have always shown for users
//!   without a profile name)

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use docease_core::{errors::AppointmentError, models::session::SessionUser};
use uuid::Uuid;

use crate::middleware::error_handling::AppError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_NAME_HEADER: &str = "x-user-name";

/// Extractor for the signed-in patient. Rejects with 401 when the
/// identity headers are missing or malformed — no mutation or read ever
/// runs without a session.
#[derive(Debug)]
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError(AppointmentError::Unauthenticated(
                    "no active session".to_string(),
                ))
            })?;

        let id = Uuid::parse_str(raw_id).map_err(|_| {
            AppError(AppointmentError::Unauthenticated(
                "malformed session identity".to_string(),
            ))
        })?;

        let display_name = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Patient")
            .to_string();

        Ok(CurrentUser(SessionUser { id, display_name }))
    }
}
