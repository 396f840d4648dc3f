use std::sync::Arc;

use docease_core::{
    errors::{AppointmentError, AppointmentResult},
    models::appointment::{Appointment, AppointmentFilter},
    models::session::SessionUser,
};
use docease_db::repositories::AppointmentStore;
use uuid::Uuid;

/// Produces the appointment list rendered for the signed-in patient.
pub struct ReadProjection {
    store: Arc<dyn AppointmentStore>,
}

impl ReadProjection {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// The caller's appointments, newest appointment date first, with the
    /// filter applied client-side. A match-less filter yields an empty
    /// list, never an error.
    pub async fn list(
        &self,
        user: &SessionUser,
        filter: &AppointmentFilter,
    ) -> AppointmentResult<Vec<Appointment>> {
        let rows = self.store.list_for_patient(user.id).await?;
        let appointments = rows
            .into_iter()
            .map(Appointment::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(apply_filter(appointments, filter))
    }

    /// Single-record fetch from the caller's own collection.
    pub async fn get(&self, user: &SessionUser, id: Uuid) -> AppointmentResult<Appointment> {
        self.store
            .get_for_patient(user.id, id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(format!("Appointment with ID {id} not found")))?
            .try_into()
    }
}

/// Applies at most one of the two filter dimensions.
///
/// A non-blank free-text query is matched case-insensitively against the
/// doctor name and department and silences the status filter entirely;
/// only when no query is present does the status filter apply. The two
/// are never combined. This exclusivity looks suspicious but is the
/// long-standing behavior of the booking UI; see DESIGN.md.
pub fn apply_filter(appointments: Vec<Appointment>, filter: &AppointmentFilter) -> Vec<Appointment> {
    let query = filter
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    if let Some(query) = query {
        return appointments
            .into_iter()
            .filter(|a| {
                a.doctor_name.to_lowercase().contains(&query)
                    || a.department.to_lowercase().contains(&query)
            })
            .collect();
    }

    if let Some(status) = filter.status {
        return appointments
            .into_iter()
            .filter(|a| a.status == status)
            .collect();
    }

    appointments
}
