use chrono::{DateTime, NaiveDate, Utc};
use docease_core::{
    errors::AppointmentError,
    models::appointment::{Appointment, AppointmentStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Primary copy of an appointment, scoped to the owning patient.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department: String,
    pub patient_name: String,
    pub appointment_date: NaiveDate,
    pub time_slot: String,
    pub reason: Option<String>,
    pub status: String,
    pub online: bool,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Global mirror of an appointment. `appointment_id` is the back-reference
/// to the primary record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointmentMirror {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department: String,
    pub patient_name: String,
    pub appointment_date: NaiveDate,
    pub time_slot: String,
    pub reason: Option<String>,
    pub status: String,
    pub online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl DbAppointment {
    /// Parses the stored status string. A value outside the known set means
    /// the row was written by something other than this service.
    pub fn parsed_status(&self) -> Result<AppointmentStatus, AppointmentError> {
        self.status
            .parse()
            .map_err(AppointmentError::Inconsistency)
    }

    /// Derives the mirror row that must accompany this primary record.
    pub fn to_mirror(&self) -> DbAppointmentMirror {
        DbAppointmentMirror {
            appointment_id: self.id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            doctor_name: self.doctor_name.clone(),
            department: self.department.clone(),
            patient_name: self.patient_name.clone(),
            appointment_date: self.appointment_date,
            time_slot: self.time_slot.clone(),
            reason: self.reason.clone(),
            status: self.status.clone(),
            online: self.online,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cancelled_at: self.cancelled_at,
        }
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = AppointmentError;

    fn try_from(row: DbAppointment) -> Result<Self, Self::Error> {
        let status = row.parsed_status()?;
        Ok(Appointment {
            id: row.id,
            doctor_id: row.doctor_id,
            doctor_name: row.doctor_name,
            department: row.department,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            appointment_date: row.appointment_date,
            time_slot: row.time_slot,
            reason: row.reason,
            status,
            online: row.online,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cancelled_at: row.cancelled_at,
        })
    }
}
