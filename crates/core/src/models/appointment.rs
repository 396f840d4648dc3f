use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of an appointment.
///
/// Transitions are monotonic: `Pending`/`Confirmed` may move to
/// `Cancelled` or `Completed`, and neither terminal state is ever left
/// again. Cancellation is a soft state change; records are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// True while the appointment can still be cancelled or rescheduled.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

/// One logical appointment.
///
/// The doctor name, department, and patient name are snapshots taken at
/// booking time, not live references; they are not refreshed if the
/// underlying doctor or patient profile later changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub appointment_date: NaiveDate,
    pub time_slot: String,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub reason: Option<String>,
    #[serde(default)]
    pub online: bool,
    /// Client-generated key used to de-duplicate retries of the same
    /// submission gesture.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentResponse {
    pub id: Uuid,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub time_slot: String,
}

/// Filter applied when listing a patient's appointments.
///
/// A non-blank free-text query takes precedence: while `q` is set the
/// status filter is ignored entirely, never combined with it. This
/// mirrors the behavior the booking UI has always had; see DESIGN.md for
/// why it is kept despite looking suspicious.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub scanned: usize,
    pub divergent: usize,
    pub repaired: usize,
}
