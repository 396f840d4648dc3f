use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Primary, patient-scoped copy of every appointment
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patient_appointments (
            id UUID PRIMARY KEY,
            patient_id UUID NOT NULL,
            doctor_id UUID NOT NULL,
            doctor_name VARCHAR(255) NOT NULL,
            department VARCHAR(255) NOT NULL,
            patient_name VARCHAR(255) NOT NULL,
            appointment_date DATE NOT NULL,
            time_slot VARCHAR(64) NOT NULL,
            reason TEXT NULL,
            status VARCHAR(16) NOT NULL,
            online BOOLEAN NOT NULL DEFAULT FALSE,
            idempotency_key VARCHAR(128) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL,
            cancelled_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Global mirror keyed by the back-reference to the primary record
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointment_index (
            appointment_id UUID PRIMARY KEY,
            patient_id UUID NOT NULL,
            doctor_id UUID NOT NULL,
            doctor_name VARCHAR(255) NOT NULL,
            department VARCHAR(255) NOT NULL,
            patient_name VARCHAR(255) NOT NULL,
            appointment_date DATE NOT NULL,
            time_slot VARCHAR(64) NOT NULL,
            reason TEXT NULL,
            status VARCHAR(16) NOT NULL,
            online BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL,
            cancelled_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Retrying a booking gesture with the same key must not create a
    // second record for the same patient
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uniq_patient_idempotency
            ON patient_appointments(patient_id, idempotency_key)
            WHERE idempotency_key IS NOT NULL;
        "#,
    )
    .execute(pool)
    .await?;

    // A doctor's slot on a date is unique among non-cancelled appointments
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uniq_doctor_slot
            ON appointment_index(doctor_id, appointment_date, time_slot)
            WHERE status <> 'cancelled';
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_patient_appointments_patient
            ON patient_appointments(patient_id, appointment_date DESC);
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_appointment_index_doctor
            ON appointment_index(doctor_id, appointment_date);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
