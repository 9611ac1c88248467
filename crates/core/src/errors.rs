use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Not subscribed: {0}")]
    NotSubscribed(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    #[error("Authorization error: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(#[from] eyre::Report),
}

impl BookingError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation",
            BookingError::NotFound(_) => "not_found",
            BookingError::Conflict(_) => "conflict",
            BookingError::InvalidState(_) => "invalid_state",
            BookingError::QuotaExhausted(_) => "quota_exhausted",
            BookingError::NotSubscribed(_) => "not_subscribed",
            BookingError::Duplicate(_) => "duplicate",
            BookingError::Unauthenticated(_) => "unauthenticated",
            BookingError::Forbidden(_) => "forbidden",
            BookingError::Storage(_) => "storage",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
