use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use docease_core::errors::{AppointmentError, AppointmentResult};
use docease_core::models::session::SessionUser;
use docease_db::models::{DbAppointment, DbAppointmentMirror};
use docease_db::repositories::{AppointmentChange, AppointmentPair, AppointmentStore};
use uuid::Uuid;

/// In-memory stand-in for the Postgres store, enforcing the same
/// idempotency and slot-uniqueness rules, with hooks for corrupting the
/// mirror so reconciliation can be exercised.
#[derive(Default)]
pub struct MemoryStore {
    primary: Mutex<HashMap<Uuid, DbAppointment>>,
    mirror: Mutex<HashMap<Uuid, DbAppointmentMirror>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_count(&self) -> usize {
        self.primary.lock().unwrap().len()
    }

    pub fn mirror_of(&self, id: Uuid) -> Option<DbAppointmentMirror> {
        self.mirror.lock().unwrap().get(&id).cloned()
    }

    pub fn drop_mirror(&self, id: Uuid) {
        self.mirror.lock().unwrap().remove(&id);
    }

    pub fn set_mirror_status(&self, id: Uuid, status: &str) {
        if let Some(m) = self.mirror.lock().unwrap().get_mut(&id) {
            m.status = status.to_string();
        }
    }

    pub fn set_primary_status(&self, id: Uuid, status: &str) {
        let mut primary = self.primary.lock().unwrap();
        if let Some(p) = primary.get_mut(&id) {
            p.status = status.to_string();
        }
        drop(primary);
        self.set_mirror_status(id, status);
    }

    fn slot_taken(&self, record: &DbAppointment, exclude: Option<Uuid>) -> bool {
        self.mirror.lock().unwrap().values().any(|m| {
            Some(m.appointment_id) != exclude
                && m.doctor_id == record.doctor_id
                && m.appointment_date == record.appointment_date
                && m.time_slot == record.time_slot
                && m.status != "cancelled"
        })
    }
}

fn apply(record: &mut DbAppointment, change: &AppointmentChange) {
    record.status = change.status.as_str().to_string();
    if let Some(date) = change.appointment_date {
        record.appointment_date = date;
    }
    if let Some(slot) = &change.time_slot {
        record.time_slot = slot.clone();
    }
    if let Some(at) = change.cancelled_at {
        record.cancelled_at = Some(at);
    }
    record.updated_at = change.updated_at;
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn insert_pair(&self, record: &DbAppointment) -> AppointmentResult<Uuid> {
        if let Some(key) = &record.idempotency_key {
            let primary = self.primary.lock().unwrap();
            if let Some(existing) = primary
                .values()
                .find(|p| p.patient_id == record.patient_id && p.idempotency_key.as_ref() == Some(key))
            {
                return Ok(existing.id);
            }
        }

        if self.slot_taken(record, None) {
            return Err(AppointmentError::Validation(
                "the selected time slot is already booked for this doctor".to_string(),
            ));
        }

        self.primary
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        self.mirror
            .lock()
            .unwrap()
            .insert(record.id, record.to_mirror());
        Ok(record.id)
    }

    async fn get_for_patient(
        &self,
        patient_id: Uuid,
        id: Uuid,
    ) -> AppointmentResult<Option<DbAppointment>> {
        Ok(self
            .primary
            .lock()
            .unwrap()
            .get(&id)
            .filter(|p| p.patient_id == patient_id)
            .cloned())
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> AppointmentResult<Vec<DbAppointment>> {
        let mut rows: Vec<_> = self
            .primary
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.appointment_date
                .cmp(&a.appointment_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn update_pair(
        &self,
        patient_id: Uuid,
        id: Uuid,
        change: &AppointmentChange,
    ) -> AppointmentResult<DbAppointment> {
        let updated = {
            let mut primary = self.primary.lock().unwrap();
            let record = primary
                .get_mut(&id)
                .filter(|p| p.patient_id == patient_id)
                .ok_or_else(|| {
                    AppointmentError::NotFound(format!("Appointment with ID {id} not found"))
                })?;

            if change.appointment_date.is_some() || change.time_slot.is_some() {
                let mut moved = record.clone();
                apply(&mut moved, change);
                if self.slot_taken(&moved, Some(id)) {
                    return Err(AppointmentError::Validation(
                        "the selected time slot is already booked for this doctor".to_string(),
                    ));
                }
            }

            apply(record, change);
            record.clone()
        };

        if let Some(m) = self.mirror.lock().unwrap().get_mut(&id) {
            let fresh = updated.to_mirror();
            *m = fresh;
        }
        Ok(updated)
    }

    async fn load_pairs(&self) -> AppointmentResult<Vec<AppointmentPair>> {
        let mirror = self.mirror.lock().unwrap();
        Ok(self
            .primary
            .lock()
            .unwrap()
            .values()
            .cloned()
            .map(|primary| {
                let m = mirror.get(&primary.id).cloned();
                AppointmentPair { primary, mirror: m }
            })
            .collect())
    }

    async fn repair_mirror(&self, primary: &DbAppointment) -> AppointmentResult<()> {
        self.mirror
            .lock()
            .unwrap()
            .insert(primary.id, primary.to_mirror());
        Ok(())
    }
}

pub fn patient(name: &str) -> SessionUser {
    SessionUser {
        id: Uuid::new_v4(),
        display_name: name.to_string(),
    }
}
