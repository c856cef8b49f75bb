use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::repository::RecordId;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: RecordId },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("a timer is already running since {started_at}")]
    TimerAlreadyRunning { started_at: DateTime<Utc> },

    #[error("no timer is running")]
    NoActiveTimer,

    #[error("no {entity} id left to assign")]
    IdsExhausted { entity: &'static str },

    #[error("cannot import backup: {0}")]
    InvalidImport(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Rejects blank text; the value itself is kept as typed.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid(field, "cannot be empty"));
    }
    Ok(value.to_string())
}
