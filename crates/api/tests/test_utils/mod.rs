use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use docease_api::ApiState;
use docease_core::models::session::SessionUser;
use docease_db::mock::repositories::MockAppointmentStore;
use docease_db::models::DbAppointment;
use uuid::Uuid;

/// Wraps a configured mock store in the real application state, so
/// handlers are exercised exactly as the router calls them.
pub fn state_with(store: MockAppointmentStore) -> Arc<ApiState> {
    Arc::new(ApiState::new(Arc::new(store)))
}

pub fn session() -> SessionUser {
    SessionUser {
        id: Uuid::new_v4(),
        display_name: "Alex Chen".to_string(),
    }
}

pub fn db_row(patient_id: Uuid, status: &str) -> DbAppointment {
    let now = Utc::now();
    DbAppointment {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id: Uuid::new_v4(),
        doctor_name: "Dr. Emma Richardson".to_string(),
        department: "Cardiology".to_string(),
        patient_name: "Alex Chen".to_string(),
        appointment_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        time_slot: "10:00 AM".to_string(),
        reason: None,
        status: status.to_string(),
        online: false,
        idempotency_key: None,
        created_at: now,
        updated_at: now,
        cancelled_at: None,
    }
}
