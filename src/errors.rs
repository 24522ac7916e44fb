use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::ledger::LedgerError;
use crate::reports::ReportError;
use crate::transactions::TransactionError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the tax-lot engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Crypto operation failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Caller-facing classification of an error.
///
/// `BadRequest` errors are client-fixable and carry actionable detail.
/// `Database` errors are infrastructure failures the caller may retry.
/// `Internal` errors are defects; callers should not retry blindly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Database,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Database(_) => ErrorKind::Database,
            Error::Validation(_) => ErrorKind::BadRequest,
            Error::Crypto(_) => ErrorKind::BadRequest,
            Error::Transaction(err) => match err {
                TransactionError::DatabaseError(_) => ErrorKind::Database,
                _ => ErrorKind::BadRequest,
            },
            Error::Ledger(err) => match err {
                LedgerError::InsufficientLots { .. } => ErrorKind::BadRequest,
                LedgerError::UnsupportedMethod(_) => ErrorKind::BadRequest,
                LedgerError::InvalidSnapshot(_) => ErrorKind::Internal,
                LedgerError::SnapshotConflict(_) => ErrorKind::Database,
                LedgerError::NotFound(_) => ErrorKind::BadRequest,
                LedgerError::DatabaseError(_) => ErrorKind::Database,
            },
            Error::Report(err) => match err {
                ReportError::DatabaseError(_) => ErrorKind::Database,
                ReportError::InvalidYear(_) => ErrorKind::BadRequest,
                ReportError::ReplayFailed { .. } => ErrorKind::Internal,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[from] diesel::result::ConnectionError),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(#[from] r2d2::Error),

    #[error("Database query failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

// Implement From for DieselError to Error directly
impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        Error::Database(DatabaseError::QueryFailed(err))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::Database(DatabaseError::PoolCreationFailed(e))
    }
}
