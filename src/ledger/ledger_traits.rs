use chrono::{DateTime, Utc};

use super::ledger_model::{Allocation, Lot, NewLot};
use super::selector::{AccountingMethod, SaleSelection};
use crate::transactions::Transaction;
use crate::Result;

/// Trait defining the contract for lot/allocation repository operations.
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_lot_by_tx_id(&self, tx_id: &str) -> Result<Option<Lot>>;
    fn get_lots_by_user_id(&self, user_id: &str) -> Result<Vec<Lot>>;
    /// Lots with a significant remaining quantity, ordered by acquisition
    /// date ascending.
    fn get_open_lots(&self, user_id: &str) -> Result<Vec<Lot>>;
    fn create_lot(&self, new_lot: NewLot) -> Result<Lot>;
    fn has_allocations_for_tx(&self, tx_id: &str) -> Result<bool>;
    fn get_allocations_for_tx(&self, tx_id: &str) -> Result<Vec<Allocation>>;
    fn get_allocations_for_lot(&self, lot_id: &str) -> Result<Vec<Allocation>>;
    /// Writes every allocation of a sale and the matching lot updates in one
    /// database transaction. Returns the number of allocations written.
    fn apply_sale(
        &self,
        user_id: &str,
        tx_id: &str,
        selection: &SaleSelection,
        sale_date: DateTime<Utc>,
    ) -> Result<usize>;
}

/// Trait defining the contract for lot-accounting side effects.
pub trait LedgerServiceTrait: Send + Sync {
    /// Creates the lot for a buy transaction. Idempotent per `tx_id`.
    fn apply_buy(&self, transaction: &Transaction) -> Result<()>;
    /// Matches a sell against open lots and persists the allocations
    /// atomically. Idempotent per `tx_id`.
    fn apply_sell(&self, transaction: &Transaction, method: AccountingMethod) -> Result<()>;
    fn get_lots(&self, user_id: &str) -> Result<Vec<Lot>>;
    fn get_open_lots(&self, user_id: &str) -> Result<Vec<Lot>>;
    fn get_allocations_for_tx(&self, tx_id: &str) -> Result<Vec<Allocation>>;
}
