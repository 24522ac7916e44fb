use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for tax report generation
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("replay failed for transaction {tx_id}: {message}")]
    ReplayFailed { tx_id: String, message: String },
    #[error("invalid report year: {0}")]
    InvalidYear(i32),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for ReportError {
    fn from(err: DieselError) -> Self {
        ReportError::DatabaseError(err.to_string())
    }
}
