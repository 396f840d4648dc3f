use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use docease_core::errors::{AppointmentError, AppointmentResult};
use docease_core::models::appointment::AppointmentStatus;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{DbAppointment, DbAppointmentMirror};

/// Partial update applied to both copies of an appointment in one go.
/// `None` fields keep their stored value.
#[derive(Debug, Clone)]
pub struct AppointmentChange {
    pub status: AppointmentStatus,
    pub appointment_date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A primary record together with whatever the global mirror currently
/// holds for it. The mirror can be absent if it was lost out of band.
#[derive(Debug, Clone)]
pub struct AppointmentPair {
    pub primary: DbAppointment,
    pub mirror: Option<DbAppointmentMirror>,
}

/// Storage contract for the appointment ledger.
///
/// One logical appointment is represented by at most two physical records:
/// the patient-scoped primary and the global mirror. Every mutation here
/// touches both or neither.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Writes the primary record and its mirror atomically. When `record`
    /// carries an idempotency key already used by the same patient, the id
    /// of the earlier record is returned and nothing is written.
    async fn insert_pair(&self, record: &DbAppointment) -> AppointmentResult<Uuid>;

    async fn get_for_patient(
        &self,
        patient_id: Uuid,
        id: Uuid,
    ) -> AppointmentResult<Option<DbAppointment>>;

    /// All of a patient's records, newest appointment date first.
    async fn list_for_patient(&self, patient_id: Uuid) -> AppointmentResult<Vec<DbAppointment>>;

    /// Applies `change` to both copies atomically and returns the updated
    /// primary record.
    async fn update_pair(
        &self,
        patient_id: Uuid,
        id: Uuid,
        change: &AppointmentChange,
    ) -> AppointmentResult<DbAppointment>;

    /// Every primary record joined with its mirror, for the
    /// reconciliation sweep.
    async fn load_pairs(&self) -> AppointmentResult<Vec<AppointmentPair>>;

    /// Rewrites the mirror from the primary copy.
    async fn repair_mirror(&self, primary: &DbAppointment) -> AppointmentResult<()>;
}

/// Name of the partial unique index that enforces one non-cancelled
/// booking per doctor/date/slot.
const SLOT_CONSTRAINT: &str = "uniq_doctor_slot";
const IDEMPOTENCY_CONSTRAINT: &str = "uniq_patient_idempotency";

pub struct PgAppointmentStore {
    pool: Pool<Postgres>,
}

impl PgAppointmentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn find_by_idempotency_key(
        &self,
        patient_id: Uuid,
        key: &str,
    ) -> AppointmentResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM patient_appointments
            WHERE patient_id = $1 AND idempotency_key = $2
            "#,
        )
        .bind(patient_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(id)
    }
}

fn persistence(err: sqlx::Error) -> AppointmentError {
    AppointmentError::Persistence(eyre::Report::new(err))
}

/// Maps constraint violations to domain errors; everything else is a
/// persistence failure.
fn map_write_error(err: sqlx::Error) -> AppointmentError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(SLOT_CONSTRAINT) {
            return AppointmentError::Validation(
                "the selected time slot is already booked for this doctor".to_string(),
            );
        }
    }
    persistence(err)
}

fn is_idempotency_conflict(err: &AppointmentError) -> bool {
    matches!(
        err,
        AppointmentError::Persistence(report)
            if report
                .downcast_ref::<sqlx::Error>()
                .and_then(|e| e.as_database_error())
                .and_then(|db| db.constraint())
                == Some(IDEMPOTENCY_CONSTRAINT)
    )
}

const PRIMARY_COLUMNS: &str = "id, patient_id, doctor_id, doctor_name, department, patient_name, \
     appointment_date, time_slot, reason, status, online, idempotency_key, \
     created_at, updated_at, cancelled_at";

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn insert_pair(&self, record: &DbAppointment) -> AppointmentResult<Uuid> {
        // Fast path for retried gestures
        if let Some(key) = &record.idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(record.patient_id, key).await? {
                tracing::debug!(
                    "Duplicate booking gesture: patient={}, key={}, existing={}",
                    record.patient_id,
                    key,
                    existing
                );
                return Ok(existing);
            }
        }

        let result = async {
            let mut tx = self.pool.begin().await.map_err(persistence)?;

            sqlx::query(
                r#"
                INSERT INTO patient_appointments
                    (id, patient_id, doctor_id, doctor_name, department, patient_name,
                     appointment_date, time_slot, reason, status, online, idempotency_key,
                     created_at, updated_at, cancelled_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(record.id)
            .bind(record.patient_id)
            .bind(record.doctor_id)
            .bind(&record.doctor_name)
            .bind(&record.department)
            .bind(&record.patient_name)
            .bind(record.appointment_date)
            .bind(&record.time_slot)
            .bind(&record.reason)
            .bind(&record.status)
            .bind(record.online)
            .bind(&record.idempotency_key)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.cancelled_at)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

            sqlx::query(
                r#"
                INSERT INTO appointment_index
                    (appointment_id, patient_id, doctor_id, doctor_name, department, patient_name,
                     appointment_date, time_slot, reason, status, online,
                     created_at, updated_at, cancelled_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(record.id)
            .bind(record.patient_id)
            .bind(record.doctor_id)
            .bind(&record.doctor_name)
            .bind(&record.department)
            .bind(&record.patient_name)
            .bind(record.appointment_date)
            .bind(&record.time_slot)
            .bind(&record.reason)
            .bind(&record.status)
            .bind(record.online)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.cancelled_at)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

            tx.commit().await.map_err(persistence)?;
            Ok(record.id)
        }
        .await;

        match result {
            Ok(id) => {
                tracing::debug!("Appointment pair created: id={}", id);
                Ok(id)
            }
            // A concurrent retry with the same key won the race; hand back
            // the id it created.
            Err(err) if is_idempotency_conflict(&err) => {
                let key = record.idempotency_key.as_deref().unwrap_or_default();
                self.find_by_idempotency_key(record.patient_id, key)
                    .await?
                    .ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn get_for_patient(
        &self,
        patient_id: Uuid,
        id: Uuid,
    ) -> AppointmentResult<Option<DbAppointment>> {
        let row = sqlx::query_as::<_, DbAppointment>(&format!(
            "SELECT {PRIMARY_COLUMNS} FROM patient_appointments WHERE patient_id = $1 AND id = $2"
        ))
        .bind(patient_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row)
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> AppointmentResult<Vec<DbAppointment>> {
        let rows = sqlx::query_as::<_, DbAppointment>(&format!(
            "SELECT {PRIMARY_COLUMNS} FROM patient_appointments \
             WHERE patient_id = $1 \
             ORDER BY appointment_date DESC, created_at DESC"
        ))
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows)
    }

    async fn update_pair(
        &self,
        patient_id: Uuid,
        id: Uuid,
        change: &AppointmentChange,
    ) -> AppointmentResult<DbAppointment> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let updated = sqlx::query_as::<_, DbAppointment>(&format!(
            r#"
            UPDATE patient_appointments
            SET status = $3,
                appointment_date = COALESCE($4, appointment_date),
                time_slot = COALESCE($5, time_slot),
                cancelled_at = COALESCE($6, cancelled_at),
                updated_at = $7
            WHERE patient_id = $1 AND id = $2
            RETURNING {PRIMARY_COLUMNS}
            "#
        ))
        .bind(patient_id)
        .bind(id)
        .bind(change.status.as_str())
        .bind(change.appointment_date)
        .bind(&change.time_slot)
        .bind(change.cancelled_at)
        .bind(change.updated_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| {
            AppointmentError::NotFound(format!("Appointment with ID {id} not found"))
        })?;

        sqlx::query(
            r#"
            UPDATE appointment_index
            SET status = $2,
                appointment_date = COALESCE($3, appointment_date),
                time_slot = COALESCE($4, time_slot),
                cancelled_at = COALESCE($5, cancelled_at),
                updated_at = $6
            WHERE appointment_id = $1
            "#,
        )
        .bind(id)
        .bind(change.status.as_str())
        .bind(change.appointment_date)
        .bind(&change.time_slot)
        .bind(change.cancelled_at)
        .bind(change.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await.map_err(persistence)?;

        tracing::debug!(
            "Appointment pair updated: id={}, status={}",
            id,
            change.status
        );
        Ok(updated)
    }

    async fn load_pairs(&self) -> AppointmentResult<Vec<AppointmentPair>> {
        let primaries = sqlx::query_as::<_, DbAppointment>(&format!(
            "SELECT {PRIMARY_COLUMNS} FROM patient_appointments ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        let mirrors = sqlx::query_as::<_, DbAppointmentMirror>(
            r#"
            SELECT appointment_id, patient_id, doctor_id, doctor_name, department, patient_name,
                   appointment_date, time_slot, reason, status, online,
                   created_at, updated_at, cancelled_at
            FROM appointment_index
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        let mut by_id: std::collections::HashMap<Uuid, DbAppointmentMirror> = mirrors
            .into_iter()
            .map(|m| (m.appointment_id, m))
            .collect();

        Ok(primaries
            .into_iter()
            .map(|primary| {
                let mirror = by_id.remove(&primary.id);
                AppointmentPair { primary, mirror }
            })
            .collect())
    }

    async fn repair_mirror(&self, primary: &DbAppointment) -> AppointmentResult<()> {
        let mirror = primary.to_mirror();

        sqlx::query(
            r#"
            INSERT INTO appointment_index
                (appointment_id, patient_id, doctor_id, doctor_name, department, patient_name,
                 appointment_date, time_slot, reason, status, online,
                 created_at, updated_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (appointment_id) DO UPDATE
            SET status = EXCLUDED.status,
                appointment_date = EXCLUDED.appointment_date,
                time_slot = EXCLUDED.time_slot,
                cancelled_at = EXCLUDED.cancelled_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(mirror.appointment_id)
        .bind(mirror.patient_id)
        .bind(mirror.doctor_id)
        .bind(&mirror.doctor_name)
        .bind(&mirror.department)
        .bind(&mirror.patient_name)
        .bind(mirror.appointment_date)
        .bind(&mirror.time_slot)
        .bind(&mirror.reason)
        .bind(&mirror.status)
        .bind(mirror.online)
        .bind(mirror.created_at)
        .bind(mirror.updated_at)
        .bind(mirror.cancelled_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }
}
