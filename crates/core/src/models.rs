pub mod appointment;
pub mod session;
