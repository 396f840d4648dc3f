pub mod appointment;
