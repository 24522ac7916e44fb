use chrono::{Datelike, TimeZone, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::is_quantity_significant;
use crate::ledger::{select_for_sale, AccountingMethod, OpenLot, SaleSelection, Term};
use crate::reports::reports_errors::ReportError;
use crate::reports::reports_model::*;
use crate::reports::reports_traits::TaxReportServiceTrait;
use crate::transactions::{
    Transaction, TransactionRepositoryTrait, TransactionType, LOT_STATUS_REJECTED,
};
use crate::Result;

/// Generates year-scoped tax reports by replaying the raw transaction log.
///
/// The replay starts from an empty simulated inventory and never reads
/// persisted Lot or Allocation rows, so two runs over the same transaction
/// history produce identical numbers even if processed state has drifted.
pub struct TaxReportService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
}

impl TaxReportService {
    pub fn new(transaction_repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self {
            transaction_repository,
        }
    }

    fn replay_sell(
        inventory: &mut Vec<OpenLot>,
        transaction: &Transaction,
    ) -> Result<SaleSelection> {
        let selection = select_for_sale(
            inventory,
            transaction.amount,
            transaction.price,
            transaction.event_date,
            AccountingMethod::default(),
        )
        .map_err(|e| ReportError::ReplayFailed {
            tx_id: transaction.id.clone(),
            message: e.to_string(),
        })?;

        for consumption in &selection.consumptions {
            if let Some(lot) = inventory.iter_mut().find(|l| l.id == consumption.lot_id) {
                lot.remaining_qty -= consumption.qty;
            }
        }
        inventory.retain(|lot| is_quantity_significant(&lot.remaining_qty));

        Ok(selection)
    }

    fn sale_entry(transaction: &Transaction, selection: &SaleSelection) -> SaleReportEntry {
        let any_long = selection.consumptions.iter().any(|c| c.is_long_term);
        let any_short = selection.consumptions.iter().any(|c| !c.is_long_term);
        let term = match (any_short, any_long) {
            (true, true) => SaleTerm::Mixed,
            (false, true) => SaleTerm::Long,
            _ => SaleTerm::Short,
        };

        SaleReportEntry {
            tx_id: transaction.id.clone(),
            sold_at: transaction.event_date,
            amount: transaction.amount,
            price: transaction.price,
            proceeds: selection.total_proceeds,
            cost_basis: selection.total_cost_basis,
            gain: selection.total_realized_gain,
            term,
            lots: selection
                .consumptions
                .iter()
                .map(|c| LotBreakdown {
                    lot_id: c.lot_id.clone(),
                    acquired_at: c.acquired_at,
                    qty: c.qty,
                    unit_cost: c.unit_cost,
                    gain: c.gain,
                    term: Term::from_long_term(c.is_long_term),
                })
                .collect(),
        }
    }
}

impl TaxReportServiceTrait for TaxReportService {
    fn generate(&self, user_id: &str, year: i32, current_price: Decimal) -> Result<TaxReport> {
        let cutoff = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .ok_or(ReportError::InvalidYear(year))?;

        let transactions = self
            .transaction_repository
            .get_transactions_before(user_id, cutoff)?;
        debug!(
            "Replaying {} transaction(s) for user {} through {}",
            transactions.len(),
            user_id,
            cutoff
        );

        let mut inventory: Vec<OpenLot> = Vec::new();
        let mut realized_gain_st = Decimal::ZERO;
        let mut realized_gain_lt = Decimal::ZERO;
        let mut details: Vec<SaleReportEntry> = Vec::new();

        for transaction in &transactions {
            let transaction_type = TransactionType::from_str(&transaction.transaction_type)
                .map_err(|message| ReportError::ReplayFailed {
                    tx_id: transaction.id.clone(),
                    message,
                })?;

            match transaction_type {
                TransactionType::Buy => {
                    inventory.push(OpenLot {
                        id: transaction.id.clone(),
                        acquired_at: transaction.event_date,
                        original_amount: transaction.amount,
                        remaining_qty: transaction.amount,
                        unit_cost: transaction.price,
                    });
                }
                TransactionType::Sell => {
                    // A rejected sell never took effect; replaying it would
                    // fail against inventory it never consumed.
                    if transaction.lot_status == LOT_STATUS_REJECTED {
                        continue;
                    }
                    let selection = Self::replay_sell(&mut inventory, transaction)?;

                    // Prior-year sales still consume simulated inventory but
                    // only the report year contributes to the totals.
                    if transaction.event_date.year() != year {
                        continue;
                    }
                    for consumption in &selection.consumptions {
                        if consumption.is_long_term {
                            realized_gain_lt += consumption.gain;
                        } else {
                            realized_gain_st += consumption.gain;
                        }
                    }
                    details.push(Self::sale_entry(transaction, &selection));
                }
            }
        }

        let mut total_unrealized_gain = Decimal::ZERO;
        let open_lots: Vec<OpenLotSummary> = inventory
            .iter()
            .map(|lot| {
                let unrealized_gain = (current_price - lot.unit_cost) * lot.remaining_qty;
                total_unrealized_gain += unrealized_gain;
                OpenLotSummary {
                    lot_id: lot.id.clone(),
                    acquired_at: lot.acquired_at,
                    remaining_qty: lot.remaining_qty,
                    unit_cost: lot.unit_cost,
                    unrealized_gain,
                }
            })
            .collect();

        Ok(TaxReport {
            user_id: user_id.to_string(),
            year,
            current_price,
            realized_gain_st,
            realized_gain_lt,
            total_realized_gain: realized_gain_st + realized_gain_lt,
            total_unrealized_gain,
            details,
            open_lots,
        })
    }
}
