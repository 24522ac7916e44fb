use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::transactions::transactions_constants::*;
use crate::transactions::transactions_errors::TransactionError;
use crate::utils::decimal_serde::decimal_serde;

type Result<T> = std::result::Result<T, TransactionError>;

/// Domain model representing an immutable economic event. The payload field
/// keeps the ciphertext exactly as received; sensitive fields never rest in
/// the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub transaction_type: String,
    pub event_date: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub amount: Decimal,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    #[serde(skip_serializing)]
    pub payload: String,
    pub lot_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for transactions
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub transaction_type: String,
    pub event_date: NaiveDateTime,
    pub amount: f64,
    pub price: f64,
    pub payload: String,
    pub lot_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for persisting a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Option<String>,
    pub user_id: String,
    pub transaction_type: String,
    pub event_date: DateTime<Utc>,
    pub amount: Decimal,
    pub price: Decimal,
    pub payload: String,
}

/// Outer envelope as submitted by the caller: a timestamp plus the encrypted
/// payload. Everything sensitive lives inside the ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionEnvelope {
    pub timestamp: String,
    pub ciphertext: String,
}

impl NewTransactionEnvelope {
    pub fn validate(&self) -> Result<()> {
        if self.ciphertext.trim().is_empty() {
            return Err(TransactionError::InvalidEnvelope(
                "Ciphertext cannot be empty".to_string(),
            ));
        }
        if parse_event_date(&self.timestamp).is_none() {
            return Err(TransactionError::InvalidEnvelope(format!(
                "Invalid timestamp '{}'. Expected ISO 8601/RFC3339 or YYYY-MM-DD",
                self.timestamp
            )));
        }
        Ok(())
    }
}

/// Canonical decrypted transaction payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub timestamp: String,
    pub amount: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TransactionPayload {
    /// Validates the decrypted payload fields
    pub fn validate(&self) -> Result<()> {
        if TransactionType::from_str(&self.transaction_type).is_err() {
            return Err(TransactionError::InvalidPayload(format!(
                "Unsupported transaction type '{}'",
                self.transaction_type
            )));
        }
        if parse_event_date(&self.timestamp).is_none() {
            return Err(TransactionError::InvalidPayload(format!(
                "Invalid timestamp '{}'. Expected ISO 8601/RFC3339 or YYYY-MM-DD",
                self.timestamp
            )));
        }
        if self.amount <= Decimal::ZERO {
            return Err(TransactionError::InvalidPayload(
                "Amount must be positive".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(TransactionError::InvalidPayload(
                "Price cannot be negative".to_string(),
            ));
        }
        if let Some(fee) = self.fee {
            if fee < Decimal::ZERO {
                return Err(TransactionError::InvalidPayload(
                    "Fee cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn event_date(&self) -> Result<DateTime<Utc>> {
        parse_event_date(&self.timestamp).ok_or_else(|| {
            TransactionError::InvalidPayload(format!("Invalid timestamp '{}'", self.timestamp))
        })
    }
}

/// Per-request caller context. The passphrase and salt are the decryption
/// secrets; their presence is enforced before any payload work starts.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: String,
    pub passphrase: Option<String>,
    pub salt: Option<String>,
}

impl SessionContext {
    pub fn secrets(&self) -> Result<(&str, &str)> {
        let passphrase = self
            .passphrase
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TransactionError::MissingSecrets("passphrase".to_string()))?;
        let salt = self
            .salt
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TransactionError::MissingSecrets("salt".to_string()))?;
        Ok((passphrase, salt))
    }
}

/// Per-row failure captured by the bulk reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReconcileError {
    pub tx_id: String,
    pub message: String,
}

/// Outcome of a bulk reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReconcileResult {
    pub processed: usize,
    pub errors: Vec<BulkReconcileError>,
}

/// Enum representing supported transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == TRANSACTION_TYPE_BUY => Ok(TransactionType::Buy),
            s if s == TRANSACTION_TYPE_SELL => Ok(TransactionType::Sell),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Per-transaction lot-processing state. A transaction row always exists
/// before its lot side effects; this status makes the gap observable instead
/// of implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LotStatus {
    Pending,
    Applied,
    Rejected,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Pending => LOT_STATUS_PENDING,
            LotStatus::Applied => LOT_STATUS_APPLIED,
            LotStatus::Rejected => LOT_STATUS_REJECTED,
        }
    }
}

impl FromStr for LotStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == LOT_STATUS_PENDING => Ok(LotStatus::Pending),
            s if s == LOT_STATUS_APPLIED => Ok(LotStatus::Applied),
            s if s == LOT_STATUS_REJECTED => Ok(LotStatus::Rejected),
            _ => Err(format!("Unknown lot status: {}", s)),
        }
    }
}

/// Parses an event timestamp in RFC3339 or date-only form. Date-only values
/// are pinned to noon UTC.
pub fn parse_event_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(12, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

// Conversion implementations
impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            transaction_type: db.transaction_type,
            event_date: DateTime::from_naive_utc_and_offset(db.event_date, Utc),
            amount: Decimal::from_f64_retain(db.amount).unwrap_or_default(),
            price: Decimal::from_f64_retain(db.price).unwrap_or_default(),
            payload: db.payload,
            lot_status: db.lot_status,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(db.updated_at, Utc),
        }
    }
}

impl From<NewTransaction> for TransactionDB {
    fn from(domain: NewTransaction) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            user_id: domain.user_id,
            transaction_type: domain.transaction_type,
            event_date: domain.event_date.naive_utc(),
            amount: domain.amount.to_f64().unwrap_or_default(),
            price: domain.price.to_f64().unwrap_or_default(),
            payload: domain.payload,
            lot_status: LOT_STATUS_PENDING.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
