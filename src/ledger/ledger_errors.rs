use diesel::result::Error as DieselError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Custom error type for lot-accounting operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient lots: need {missing} more BTC")]
    InsufficientLots { missing: Decimal },
    #[error("invalid lot snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("open lots changed during sale: {0}")]
    SnapshotConflict(String),
    #[error("unsupported accounting method: {0}")]
    UnsupportedMethod(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for LedgerError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => LedgerError::NotFound("Record not found".to_string()),
            _ => LedgerError::DatabaseError(err.to_string()),
        }
    }
}
