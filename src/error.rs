use thiserror::Error;

use crate::db::models::{AppointmentStatus, StatusAction};

/// Error taxonomy for the scheduling core. Everything is returned as a
/// value to the caller; nothing in the booking path panics.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("requested slot is not covered by an open availability window")]
    NotBookable,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("caller does not own the referenced entity")]
    NotOwner,

    #[error("cannot {action} an appointment in status {from}")]
    InvalidTransition {
        from: AppointmentStatus,
        action: StatusAction,
    },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl SchedulingError {
    /// Only storage failures are safe to retry; every other kind is a
    /// terminal answer for the triggering request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulingError::Storage(_))
    }
}

impl From<sqlx::Error> for SchedulingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                SchedulingError::NotFound("record not found".to_string())
            }
            other => SchedulingError::Storage(other.to_string()),
        }
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
