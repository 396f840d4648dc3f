//! # DocEase Appointment Ledger
//!
//! Business logic for the appointment booking flow: the mutation
//! coordinator (create / cancel / reschedule), the read projection the
//! appointment list is rendered from, and the reconciliation sweep that
//! repairs divergence between the two stored copies of a record.
//!
//! All three are written against the [`AppointmentStore`] contract from
//! `docease-db`, so they run unchanged over Postgres in production and
//! over in-memory stores in tests.
//!
//! [`AppointmentStore`]: docease_db::repositories::AppointmentStore

pub mod coordinator;
pub mod projection;
pub mod reconcile;

pub use coordinator::MutationCoordinator;
pub use projection::ReadProjection;
pub use reconcile::{sweep, ReconcileReport};
