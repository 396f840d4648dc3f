use docease_core::errors::AppointmentResult;
use docease_db::models::{DbAppointment, DbAppointmentMirror};
use docease_db::repositories::AppointmentStore;
use serde::Serialize;

/// How a mirror record disagrees with its primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Divergence {
    /// The global mirror row is gone entirely.
    MissingMirror,
    StatusMismatch,
    DateMismatch,
    SlotMismatch,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub divergent: usize,
    pub repaired: usize,
}

/// Compares the fields the two copies must agree on. The primary copy is
/// authoritative; the mirror is only a read-optimized projection of it.
pub fn classify(primary: &DbAppointment, mirror: Option<&DbAppointmentMirror>) -> Option<Divergence> {
    let Some(mirror) = mirror else {
        return Some(Divergence::MissingMirror);
    };

    if mirror.status != primary.status {
        Some(Divergence::StatusMismatch)
    } else if mirror.appointment_date != primary.appointment_date {
        Some(Divergence::DateMismatch)
    } else if mirror.time_slot != primary.time_slot {
        Some(Divergence::SlotMismatch)
    } else {
        None
    }
}

/// Walks every appointment pair, repairing mirrors that have drifted from
/// their primary record. Individual repair failures are logged and
/// counted but do not abort the sweep.
pub async fn sweep(store: &dyn AppointmentStore) -> AppointmentResult<ReconcileReport> {
    let pairs = store.load_pairs().await?;
    let mut report = ReconcileReport {
        scanned: pairs.len(),
        ..Default::default()
    };

    for pair in &pairs {
        let Some(divergence) = classify(&pair.primary, pair.mirror.as_ref()) else {
            continue;
        };
        report.divergent += 1;

        tracing::warn!(
            "Appointment copies diverged: id={}, kind={:?}",
            pair.primary.id,
            divergence
        );

        match store.repair_mirror(&pair.primary).await {
            Ok(()) => report.repaired += 1,
            Err(err) => {
                tracing::error!(
                    "Failed to repair mirror: id={}, error={}",
                    pair.primary.id,
                    err
                );
            }
        }
    }

    if report.divergent == 0 {
        tracing::debug!("Reconciliation sweep clean: scanned={}", report.scanned);
    } else {
        tracing::info!(
            "Reconciliation sweep finished: scanned={}, divergent={}, repaired={}",
            report.scanned,
            report.divergent,
            report.repaired
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn primary() -> DbAppointment {
        let now = Utc::now();
        DbAppointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr. A".to_string(),
            department: "Cardiology".to_string(),
            patient_name: "Alex Chen".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time_slot: "10:00 AM".to_string(),
            reason: None,
            status: "pending".to_string(),
            online: false,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    #[test]
    fn matching_pair_is_clean() {
        let p = primary();
        let m = p.to_mirror();
        assert_eq!(classify(&p, Some(&m)), None);
    }

    #[test]
    fn missing_mirror_is_flagged() {
        let p = primary();
        assert_eq!(classify(&p, None), Some(Divergence::MissingMirror));
    }

    #[test]
    fn status_drift_is_flagged() {
        let p = primary();
        let mut m = p.to_mirror();
        m.status = "cancelled".to_string();
        assert_eq!(classify(&p, Some(&m)), Some(Divergence::StatusMismatch));
    }

    #[test]
    fn date_drift_is_flagged() {
        let p = primary();
        let mut m = p.to_mirror();
        m.appointment_date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(classify(&p, Some(&m)), Some(Divergence::DateMismatch));
    }

    #[test]
    fn slot_drift_is_flagged() {
        let p = primary();
        let mut m = p.to_mirror();
        m.time_slot = "11:00 AM".to_string();
        assert_eq!(classify(&p, Some(&m)), Some(Divergence::SlotMismatch));
    }
}
