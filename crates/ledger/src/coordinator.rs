use std::sync::Arc;

use chrono::Utc;
use docease_core::{
    errors::{AppointmentError, AppointmentResult},
    models::appointment::{
        Appointment, AppointmentStatus, BookAppointmentRequest, BookAppointmentResponse,
        RescheduleAppointmentRequest,
    },
    models::session::SessionUser,
};
use docease_db::models::DbAppointment;
use docease_db::repositories::{AppointmentChange, AppointmentStore};
use uuid::Uuid;

/// Turns a user-initiated booking, cancellation, or reschedule into a
/// consistent pair of writes against the two stored copies of the record.
///
/// Appointment identifiers are generated here (`Uuid::new_v4`), not by
/// the store; the store only enforces their uniqueness.
pub struct MutationCoordinator {
    store: Arc<dyn AppointmentStore>,
}

impl MutationCoordinator {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Books a new appointment for the signed-in patient.
    ///
    /// Retrying with the same idempotency key returns the identifier of
    /// the appointment the first attempt created, so a double-tapped
    /// submit button never produces two records.
    pub async fn create(
        &self,
        user: &SessionUser,
        request: BookAppointmentRequest,
    ) -> AppointmentResult<BookAppointmentResponse> {
        validate_booking(&request)?;

        let now = Utc::now();
        let record = DbAppointment {
            id: Uuid::new_v4(),
            patient_id: user.id,
            doctor_id: request.doctor_id,
            doctor_name: request.doctor_name.trim().to_string(),
            department: request.department.trim().to_string(),
            patient_name: user.display_name.clone(),
            appointment_date: request.date,
            time_slot: request.time_slot.trim().to_string(),
            reason: request.reason.filter(|r| !r.trim().is_empty()),
            status: AppointmentStatus::Pending.as_str().to_string(),
            online: request.online,
            idempotency_key: normalize_key(request.idempotency_key),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };

        let id = self.store.insert_pair(&record).await?;

        tracing::info!(
            "Appointment booked: id={}, patient={}, doctor={}, date={}, slot={}",
            id,
            user.id,
            record.doctor_id,
            record.appointment_date,
            record.time_slot
        );

        Ok(BookAppointmentResponse {
            id,
            status: AppointmentStatus::Pending,
            created_at: now,
        })
    }

    /// Cancels one of the caller's appointments.
    ///
    /// Cancelling an already-cancelled appointment is a no-op that
    /// returns the record unchanged; a completed appointment cannot be
    /// cancelled.
    pub async fn cancel(&self, user: &SessionUser, id: Uuid) -> AppointmentResult<Appointment> {
        let record = self.require_owned(user, id).await?;

        match record.parsed_status()? {
            AppointmentStatus::Cancelled => {
                tracing::debug!("Cancel of already-cancelled appointment: id={}", id);
                return record.try_into();
            }
            AppointmentStatus::Completed => {
                return Err(AppointmentError::Validation(
                    "a completed appointment cannot be cancelled".to_string(),
                ));
            }
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => {}
        }

        let now = Utc::now();
        let change = AppointmentChange {
            status: AppointmentStatus::Cancelled,
            appointment_date: None,
            time_slot: None,
            cancelled_at: Some(now),
            updated_at: now,
        };

        let updated = self.store.update_pair(user.id, id, &change).await?;
        tracing::info!("Appointment cancelled: id={}, patient={}", id, user.id);
        updated.try_into()
    }

    /// Moves one of the caller's appointments to a new date and slot and
    /// resets it to pending. Cancelled and completed appointments are
    /// never resurrected.
    pub async fn reschedule(
        &self,
        user: &SessionUser,
        id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> AppointmentResult<Appointment> {
        if request.time_slot.trim().is_empty() {
            return Err(AppointmentError::Validation(
                "a time slot is required to reschedule".to_string(),
            ));
        }

        let record = self.require_owned(user, id).await?;

        let status = record.parsed_status()?;
        if !status.is_active() {
            return Err(AppointmentError::Validation(format!(
                "a {status} appointment cannot be rescheduled"
            )));
        }

        let change = AppointmentChange {
            status: AppointmentStatus::Pending,
            appointment_date: Some(request.date),
            time_slot: Some(request.time_slot.trim().to_string()),
            cancelled_at: None,
            updated_at: Utc::now(),
        };

        let updated = self.store.update_pair(user.id, id, &change).await?;
        tracing::info!(
            "Appointment rescheduled: id={}, patient={}, date={}, slot={}",
            id,
            user.id,
            updated.appointment_date,
            updated.time_slot
        );
        updated.try_into()
    }

    /// Resolves the appointment in the caller's own collection; a record
    /// that exists but belongs to someone else is indistinguishable from
    /// one that does not exist.
    async fn require_owned(&self, user: &SessionUser, id: Uuid) -> AppointmentResult<DbAppointment> {
        self.store
            .get_for_patient(user.id, id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(format!("Appointment with ID {id} not found")))
    }
}

fn validate_booking(request: &BookAppointmentRequest) -> AppointmentResult<()> {
    if request.doctor_name.trim().is_empty() {
        return Err(AppointmentError::Validation(
            "a doctor name is required".to_string(),
        ));
    }
    if request.department.trim().is_empty() {
        return Err(AppointmentError::Validation(
            "a department is required".to_string(),
        ));
    }
    if request.time_slot.trim().is_empty() {
        return Err(AppointmentError::Validation(
            "a time slot is required".to_string(),
        ));
    }
    Ok(())
}

/// Blank keys are treated as absent so an empty form field does not
/// collide with other empty form fields.
fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}
