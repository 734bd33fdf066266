use thiserror::Error;

use crate::models::TransactionStatus;

/// Errors surfaced by the storage layer, the payment stub and the session.
#[derive(Debug, Error)]
pub(crate) enum TrackerError {
    #[error("Category '{0}' already exists")]
    DuplicateName(String),

    #[error("Category {0} does not exist")]
    InvalidCategory(i64),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transaction id '{0}' is already in use")]
    DuplicateTransaction(String),

    #[error("Transaction cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("No active payment to check")]
    NoActivePayment,

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl TrackerError {
    pub(crate) fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }
}

pub(crate) type Result<T> = std::result::Result<T, TrackerError>;

/// Extended SQLite result code of a failed statement, if it was a constraint violation.
pub(crate) fn constraint_code(err: &rusqlite::Error) -> Option<std::os::raw::c_int> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}
