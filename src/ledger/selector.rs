use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{LONG_TERM_HOLDING_DAYS, QUANTITY_EPSILON};
use crate::ledger::ledger_errors::LedgerError;
use crate::utils::decimal_serde::decimal_serde;

type Result<T> = std::result::Result<T, LedgerError>;

/// Closed set of supported lot-accounting methods. Adding FIFO/LIFO later is
/// an exhaustive-match change, not a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountingMethod {
    Hifo,
}

impl AccountingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountingMethod::Hifo => "HIFO",
        }
    }
}

impl Default for AccountingMethod {
    fn default() -> Self {
        AccountingMethod::Hifo
    }
}

impl FromStr for AccountingMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "HIFO" => Ok(AccountingMethod::Hifo),
            other => Err(LedgerError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Snapshot of one open lot, as seen at selection time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLot {
    pub id: String,
    pub acquired_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub original_amount: Decimal,
    #[serde(with = "decimal_serde")]
    pub remaining_qty: Decimal,
    #[serde(with = "decimal_serde")]
    pub unit_cost: Decimal,
}

/// One lot's contribution to a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotConsumption {
    pub lot_id: String,
    pub acquired_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub qty: Decimal,
    #[serde(with = "decimal_serde")]
    pub unit_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub proceeds: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain: Decimal,
    pub is_long_term: bool,
}

/// Result of matching one sale against the open-lot snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSelection {
    pub consumptions: Vec<LotConsumption>,
    #[serde(with = "decimal_serde")]
    pub total_cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_proceeds: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_realized_gain: Decimal,
    pub is_all_long_term: bool,
}

/// A disposal is long-term when held strictly longer than 365 days. This is a
/// pure duration threshold, not a calendar-year rule.
pub fn is_long_term(acquired_at: DateTime<Utc>, sold_at: DateTime<Utc>) -> bool {
    sold_at.signed_duration_since(acquired_at) > Duration::days(LONG_TERM_HOLDING_DAYS)
}

/// Selects which open lots a sale consumes, in what order, and with what
/// per-lot cost basis, proceeds, gain, and term.
///
/// Pure computation over the snapshot: no I/O, no mutation of shared state.
/// HIFO orders lots by unit cost descending; lots with equal unit cost keep
/// their input order (stable sort, tested policy). If the snapshot cannot
/// cover `sale_amount` the whole selection fails with `InsufficientLots`
/// carrying the unmet quantity; a sale is never silently under-filled.
pub fn select_for_sale(
    open_lots: &[OpenLot],
    sale_amount: Decimal,
    sale_price: Decimal,
    sale_date: DateTime<Utc>,
    method: AccountingMethod,
) -> Result<SaleSelection> {
    if sale_amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidSnapshot(format!(
            "sale amount must be positive, got {}",
            sale_amount
        )));
    }
    if sale_price < Decimal::ZERO {
        return Err(LedgerError::InvalidSnapshot(format!(
            "sale price must not be negative, got {}",
            sale_price
        )));
    }
    for lot in open_lots {
        if lot.remaining_qty <= Decimal::ZERO || lot.remaining_qty > lot.original_amount {
            return Err(LedgerError::InvalidSnapshot(format!(
                "lot {} has remaining {} outside (0, {}]",
                lot.id, lot.remaining_qty, lot.original_amount
            )));
        }
        if lot.unit_cost < Decimal::ZERO {
            return Err(LedgerError::InvalidSnapshot(format!(
                "lot {} has negative unit cost {}",
                lot.id, lot.unit_cost
            )));
        }
    }

    let mut ordered: Vec<&OpenLot> = open_lots.iter().collect();
    match method {
        // Stable sort: equal unit costs keep their input order.
        AccountingMethod::Hifo => ordered.sort_by(|a, b| b.unit_cost.cmp(&a.unit_cost)),
    }

    let mut remaining_to_sell = sale_amount;
    let mut consumptions: Vec<LotConsumption> = Vec::new();
    let mut total_cost_basis = Decimal::ZERO;
    let mut total_proceeds = Decimal::ZERO;
    let mut is_all_long_term = true;

    for lot in ordered {
        if remaining_to_sell <= *QUANTITY_EPSILON {
            break;
        }

        let qty = lot.remaining_qty.min(remaining_to_sell);
        let cost_basis = qty * lot.unit_cost;
        let proceeds = qty * sale_price;
        let long_term = is_long_term(lot.acquired_at, sale_date);

        total_cost_basis += cost_basis;
        total_proceeds += proceeds;
        is_all_long_term &= long_term;
        remaining_to_sell -= qty;

        consumptions.push(LotConsumption {
            lot_id: lot.id.clone(),
            acquired_at: lot.acquired_at,
            qty,
            unit_cost: lot.unit_cost,
            cost_basis,
            proceeds,
            gain: proceeds - cost_basis,
            is_long_term: long_term,
        });
    }

    if remaining_to_sell > *QUANTITY_EPSILON {
        return Err(LedgerError::InsufficientLots {
            missing: remaining_to_sell,
        });
    }

    Ok(SaleSelection {
        consumptions,
        total_cost_basis,
        total_proceeds,
        total_realized_gain: total_proceeds - total_cost_basis,
        is_all_long_term,
    })
}
