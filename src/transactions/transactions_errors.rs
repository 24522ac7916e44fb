use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for transaction processing
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Session is missing required secrets: {0}")]
    MissingSecrets(String),
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for TransactionError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => TransactionError::NotFound("Record not found".to_string()),
            _ => TransactionError::DatabaseError(err.to_string()),
        }
    }
}
