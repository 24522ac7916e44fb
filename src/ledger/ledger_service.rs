use log::{debug, info, warn};
use std::sync::Arc;

use crate::ledger::ledger_errors::LedgerError;
use crate::ledger::ledger_model::{Allocation, Lot, NewLot};
use crate::ledger::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
use crate::ledger::selector::{select_for_sale, AccountingMethod, OpenLot};
use crate::transactions::Transaction;
use crate::{Error, Result};

/// Attempts per sell before a snapshot conflict is surfaced to the caller.
const MAX_SELL_ATTEMPTS: u32 = 3;

/// Service applying lot-accounting side effects of persisted transactions.
pub struct LedgerService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
}

impl LedgerService {
    pub fn new(ledger_repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self { ledger_repository }
    }
}

impl LedgerServiceTrait for LedgerService {
    fn apply_buy(&self, transaction: &Transaction) -> Result<()> {
        if self
            .ledger_repository
            .get_lot_by_tx_id(&transaction.id)?
            .is_some()
        {
            debug!(
                "Lot already exists for buy transaction {}, skipping",
                transaction.id
            );
            return Ok(());
        }

        let lot = self.ledger_repository.create_lot(NewLot {
            tx_id: transaction.id.clone(),
            user_id: transaction.user_id.clone(),
            opened_at: transaction.event_date,
            amount: transaction.amount,
            price: transaction.price,
        })?;
        debug!(
            "Created lot {} for buy transaction {} ({} BTC @ {})",
            lot.id, transaction.id, transaction.amount, transaction.price
        );
        Ok(())
    }

    /// Optimistic concurrency: the selection runs against a snapshot, the
    /// writes run inside one database transaction that re-checks every lot's
    /// remaining quantity. A concurrent sale that invalidates the snapshot
    /// rolls the whole write back, and the selection is retried against a
    /// fresh snapshot up to `MAX_SELL_ATTEMPTS` times.
    fn apply_sell(&self, transaction: &Transaction, method: AccountingMethod) -> Result<()> {
        if self
            .ledger_repository
            .has_allocations_for_tx(&transaction.id)?
        {
            debug!(
                "Allocations already exist for sell transaction {}, skipping",
                transaction.id
            );
            return Ok(());
        }

        let mut attempt = 1;
        loop {
            let open_lots = self.ledger_repository.get_open_lots(&transaction.user_id)?;
            let snapshot: Vec<OpenLot> = open_lots.iter().map(Lot::to_open_lot).collect();

            let selection = select_for_sale(
                &snapshot,
                transaction.amount,
                transaction.price,
                transaction.event_date,
                method,
            )?;

            match self.ledger_repository.apply_sale(
                &transaction.user_id,
                &transaction.id,
                &selection,
                transaction.event_date,
            ) {
                Ok(written) => {
                    info!(
                        "Sell transaction {} consumed {} lot(s), realized gain {}",
                        transaction.id, written, selection.total_realized_gain
                    );
                    return Ok(());
                }
                Err(Error::Ledger(LedgerError::SnapshotConflict(reason)))
                    if attempt < MAX_SELL_ATTEMPTS =>
                {
                    attempt += 1;
                    warn!(
                        "Open lots changed under sell transaction {} ({}), retry {}/{}",
                        transaction.id, reason, attempt, MAX_SELL_ATTEMPTS
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn get_lots(&self, user_id: &str) -> Result<Vec<Lot>> {
        self.ledger_repository.get_lots_by_user_id(user_id)
    }

    fn get_open_lots(&self, user_id: &str) -> Result<Vec<Lot>> {
        self.ledger_repository.get_open_lots(user_id)
    }

    fn get_allocations_for_tx(&self, tx_id: &str) -> Result<Vec<Allocation>> {
        self.ledger_repository.get_allocations_for_tx(tx_id)
    }
}
