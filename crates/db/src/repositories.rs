pub mod appointment;

pub use appointment::{AppointmentChange, AppointmentPair, AppointmentStore, PgAppointmentStore};
