use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ledger::selector::OpenLot;
use crate::utils::decimal_serde::{decimal_serde, decimal_serde_option};

/// Holding-period classification of a consumed lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Short,
    Long,
}

impl Term {
    pub fn from_long_term(is_long_term: bool) -> Self {
        if is_long_term {
            Term::Long
        } else {
            Term::Short
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Term::Short => "Short",
            Term::Long => "Long",
        }
    }
}

impl FromStr for Term {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Short" => Ok(Term::Short),
            "Long" => Ok(Term::Long),
            _ => Err(format!("Unknown term: {}", s)),
        }
    }
}

/// Domain model for a unit of acquired inventory, created from one buy
/// transaction. `cost_basis_usd` is fixed at creation and never recomputed;
/// `remaining_qty` only decreases as allocations consume the lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: String,
    pub tx_id: String,
    pub user_id: String,
    pub opened_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub original_amount: Decimal,
    #[serde(with = "decimal_serde")]
    pub remaining_qty: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis_usd: Decimal,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(with = "decimal_serde_option")]
    pub proceeds_usd: Option<Decimal>,
    #[serde(with = "decimal_serde_option")]
    pub gain_usd: Option<Decimal>,
    pub term: Option<Term>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lot {
    /// Acquisition price per unit, derived from the fixed cost basis.
    pub fn unit_cost(&self) -> Decimal {
        if self.original_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.cost_basis_usd / self.original_amount
        }
    }

    pub fn is_open(&self) -> bool {
        crate::constants::is_quantity_significant(&self.remaining_qty)
    }

    /// Snapshot view consumed by the lot selector.
    pub fn to_open_lot(&self) -> OpenLot {
        OpenLot {
            id: self.id.clone(),
            acquired_at: self.opened_at,
            original_amount: self.original_amount,
            remaining_qty: self.remaining_qty,
            unit_cost: self.unit_cost(),
        }
    }
}

/// Database model for lots
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::lots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct LotDB {
    pub id: String,
    pub tx_id: String,
    pub user_id: String,
    pub opened_at: NaiveDateTime,
    pub original_amount: f64,
    pub remaining_qty: f64,
    pub cost_basis_usd: f64,
    pub closed_at: Option<NaiveDateTime>,
    pub proceeds_usd: Option<f64>,
    pub gain_usd: Option<f64>,
    pub term: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a lot from a buy transaction.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub tx_id: String,
    pub user_id: String,
    pub opened_at: DateTime<Utc>,
    pub amount: Decimal,
    pub price: Decimal,
}

/// Domain model recording one lot consumed by one sell transaction.
/// Append-only; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub id: String,
    pub tx_id: String,
    pub lot_id: String,
    pub user_id: String,
    #[serde(with = "decimal_serde")]
    pub qty: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_usd: Decimal,
    #[serde(with = "decimal_serde")]
    pub proceeds_usd: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain_usd: Decimal,
    pub is_long_term: bool,
    pub created_at: DateTime<Utc>,
}

/// Database model for allocations
#[derive(Queryable, Selectable, Identifiable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::allocations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllocationDB {
    pub id: String,
    pub tx_id: String,
    pub lot_id: String,
    pub user_id: String,
    pub qty: f64,
    pub cost_usd: f64,
    pub proceeds_usd: f64,
    pub gain_usd: f64,
    pub is_long_term: bool,
    pub created_at: NaiveDateTime,
}

// Conversion implementations
impl From<LotDB> for Lot {
    fn from(db: LotDB) -> Self {
        Self {
            id: db.id,
            tx_id: db.tx_id,
            user_id: db.user_id,
            opened_at: DateTime::from_naive_utc_and_offset(db.opened_at, Utc),
            original_amount: Decimal::from_f64_retain(db.original_amount).unwrap_or_default(),
            remaining_qty: Decimal::from_f64_retain(db.remaining_qty).unwrap_or_default(),
            cost_basis_usd: Decimal::from_f64_retain(db.cost_basis_usd).unwrap_or_default(),
            closed_at: db
                .closed_at
                .map(|ts| DateTime::from_naive_utc_and_offset(ts, Utc)),
            proceeds_usd: db
                .proceeds_usd
                .and_then(Decimal::from_f64_retain),
            gain_usd: db.gain_usd.and_then(Decimal::from_f64_retain),
            term: db.term.as_deref().and_then(|t| Term::from_str(t).ok()),
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(db.updated_at, Utc),
        }
    }
}

impl From<NewLot> for LotDB {
    fn from(domain: NewLot) -> Self {
        let now = Utc::now().naive_utc();
        let amount = domain.amount.to_f64().unwrap_or_default();
        let cost_basis = (domain.amount * domain.price).to_f64().unwrap_or_default();

        Self {
            id: String::new(), // Assigned by the repository at insert time
            tx_id: domain.tx_id,
            user_id: domain.user_id,
            opened_at: domain.opened_at.naive_utc(),
            original_amount: amount,
            remaining_qty: amount,
            cost_basis_usd: cost_basis,
            closed_at: None,
            proceeds_usd: None,
            gain_usd: None,
            term: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<AllocationDB> for Allocation {
    fn from(db: AllocationDB) -> Self {
        Self {
            id: db.id,
            tx_id: db.tx_id,
            lot_id: db.lot_id,
            user_id: db.user_id,
            qty: Decimal::from_f64_retain(db.qty).unwrap_or_default(),
            cost_usd: Decimal::from_f64_retain(db.cost_usd).unwrap_or_default(),
            proceeds_usd: Decimal::from_f64_retain(db.proceeds_usd).unwrap_or_default(),
            gain_usd: Decimal::from_f64_retain(db.gain_usd).unwrap_or_default(),
            is_long_term: db.is_long_term,
            created_at: DateTime::from_naive_utc_and_offset(db.created_at, Utc),
        }
    }
}
