use axum::{
    extract::{Path, Query, State},
    Json,
};
use docease_core::models::appointment::{
    Appointment, AppointmentFilter, BookAppointmentRequest, BookAppointmentResponse,
    ReconcileResponse, RescheduleAppointmentRequest,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use docease_core::errors::AppointmentError;

use crate::{
    middleware::{auth::CurrentUser, error_handling::AppError},
    ApiState,
};

/// Query parameters for the appointment list endpoint.
///
/// The status value arrives as a raw string so an unknown value can be
/// reported as a validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    /// Status filter: one of `pending`, `confirmed`, `cancelled`, `completed`
    pub status: Option<String>,

    /// Free-text query matched against doctor name and department.
    /// While present, the status filter is ignored.
    pub q: Option<String>,
}

fn parse_filter(query: ListAppointmentsQuery) -> Result<AppointmentFilter, AppError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse().map_err(|_| {
            AppError(AppointmentError::Validation(format!(
                "unknown status filter: {raw}"
            )))
        })?),
    };

    Ok(AppointmentFilter { status, q: query.q })
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<Json<BookAppointmentResponse>, AppError> {
    let response = state.coordinator.create(&user, payload).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let filter = parse_filter(query)?;
    let appointments = state.projection.list(&user, &filter).await?;
    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.projection.get(&user, id).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.coordinator.cancel(&user, id).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.coordinator.reschedule(&user, id, payload).await?;
    Ok(Json(appointment))
}

/// Walks every appointment pair and repairs mirrors that drifted from
/// their primary record. Success of a user-facing mutation never depends
/// on this; it is the background-repair half of the design.
#[axum::debug_handler]
pub async fn reconcile_appointments(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let report = docease_ledger::sweep(state.store.as_ref()).await?;
    Ok(Json(ReconcileResponse {
        scanned: report.scanned,
        divergent: report.divergent,
        repaired: report.repaired,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docease_core::models::appointment::AppointmentStatus;

    #[test]
    fn blank_status_is_no_filter() {
        let filter = parse_filter(ListAppointmentsQuery {
            status: Some("  ".to_string()),
            q: None,
        })
        .unwrap();
        assert!(filter.status.is_none());
    }

    #[test]
    fn known_status_parses() {
        let filter = parse_filter(ListAppointmentsQuery {
            status: Some("cancelled".to_string()),
            q: None,
        })
        .unwrap();
        assert_eq!(filter.status, Some(AppointmentStatus::Cancelled));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = parse_filter(ListAppointmentsQuery {
            status: Some("archived".to_string()),
            q: None,
        });
        assert!(result.is_err());
    }
}
