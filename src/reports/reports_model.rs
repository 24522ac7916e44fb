use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Term;
use crate::utils::decimal_serde::decimal_serde;

/// Overall holding-period classification of one sale. `Mixed` exactly when
/// the sale drew from both short- and long-term lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleTerm {
    Short,
    Long,
    Mixed,
}

impl SaleTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleTerm::Short => "Short",
            SaleTerm::Long => "Long",
            SaleTerm::Mixed => "Mixed",
        }
    }
}

/// One lot's contribution to a reported sale, for audit purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotBreakdown {
    pub lot_id: String,
    pub acquired_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub qty: Decimal,
    #[serde(with = "decimal_serde")]
    pub unit_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain: Decimal,
    pub term: Term,
}

/// One sale that falls inside the report year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReportEntry {
    pub tx_id: String,
    pub sold_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub amount: Decimal,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    #[serde(with = "decimal_serde")]
    pub proceeds: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain: Decimal,
    pub term: SaleTerm,
    pub lots: Vec<LotBreakdown>,
}

/// Inventory still open at the end of the replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLotSummary {
    pub lot_id: String,
    pub acquired_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub remaining_qty: Decimal,
    #[serde(with = "decimal_serde")]
    pub unit_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
}

/// Year-scoped tax report derived by replaying the full transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxReport {
    pub user_id: String,
    pub year: i32,
    #[serde(with = "decimal_serde")]
    pub current_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain_st: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain_lt: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_unrealized_gain: Decimal,
    pub details: Vec<SaleReportEntry>,
    pub open_lots: Vec<OpenLotSummary>,
}
