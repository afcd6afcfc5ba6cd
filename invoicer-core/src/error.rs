use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the ledger and its store.
///
/// Every variant is returned to the caller; nothing is retried internally.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing input. Recoverable by correcting the request.
    #[error("{0}")]
    Validation(String),

    /// The due date could not be parsed or is not in the future.
    #[error("{0}")]
    InvalidDueDate(String),

    #[error("invoice {0} not found")]
    NotFound(Uuid),

    #[error("paid_amount {paid} is greater than the outstanding amount {outstanding}")]
    Overpayment { paid: Decimal, outstanding: Decimal },

    /// Opaque store failure.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// A money total left the representable decimal range.
    pub fn total_overflow() -> Self {
        LedgerError::Validation("invoice total overflow".to_string())
    }

    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation_error",
            LedgerError::InvalidDueDate(_) => "invalid_due_date",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Overpayment { .. } => "overpayment",
            LedgerError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
