use std::error::Error;

use docease_core::errors::{AppointmentError, AppointmentResult};

#[test]
fn test_appointment_error_display() {
    let unauthenticated = AppointmentError::Unauthenticated("no active session".to_string());
    let validation = AppointmentError::Validation("a time slot is required".to_string());
    let not_found = AppointmentError::NotFound("Appointment not found".to_string());
    let persistence = AppointmentError::Persistence(eyre::eyre!("connection refused"));
    let inconsistency = AppointmentError::Inconsistency("copies disagree on status".to_string());
    let internal = AppointmentError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(
        unauthenticated.to_string(),
        "Unauthenticated: no active session"
    );
    assert_eq!(
        validation.to_string(),
        "Validation error: a time slot is required"
    );
    assert_eq!(
        not_found.to_string(),
        "Resource not found: Appointment not found"
    );
    assert!(persistence.to_string().contains("Persistence error:"));
    assert_eq!(
        inconsistency.to_string(),
        "Inconsistency detected: copies disagree on status"
    );
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let err = AppointmentError::Internal(Box::new(io_error));

    assert!(err.source().is_some());
}

#[test]
fn test_report_conversion() {
    let report = eyre::eyre!("write rejected");
    let err: AppointmentError = report.into();

    assert!(matches!(err, AppointmentError::Persistence(_)));
}

#[test]
fn test_appointment_result() {
    let result: AppointmentResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: AppointmentResult<i32> =
        Err(AppointmentError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}
