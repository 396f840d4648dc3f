use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] eyre::Report),

    #[error("Inconsistency detected: {0}")]
    Inconsistency(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type AppointmentResult<T> = Result<T, AppointmentError>;
