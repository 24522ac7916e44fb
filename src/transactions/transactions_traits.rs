use chrono::{DateTime, Utc};

use super::transactions_model::*;
use crate::ledger::AccountingMethod;
use crate::Result;

/// Trait defining the contract for transaction repository operations.
pub trait TransactionRepositoryTrait: Send + Sync {
    fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction>;
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    /// All of a user's transactions, ordered by event date ascending.
    fn get_transactions_by_user_id(&self, user_id: &str) -> Result<Vec<Transaction>>;
    /// Transactions strictly before `cutoff`, ordered by event date ascending.
    fn get_transactions_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;
    fn set_lot_status(&self, transaction_id: &str, status: LotStatus) -> Result<()>;
    /// Cascading delete of everything the user owns:
    /// allocations, then lots, then transactions, in one database transaction.
    fn clear_all(&self, user_id: &str) -> Result<()>;
}

/// Trait defining the caller-facing operation surface of the engine.
#[async_trait::async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    /// Decrypts, validates, persists, and lot-processes one transaction.
    /// Returns the new transaction id.
    async fn process_transaction(
        &self,
        envelope: NewTransactionEnvelope,
        session: &SessionContext,
    ) -> Result<String>;
    /// Applies lot side effects to already-persisted transactions,
    /// isolating per-row failures.
    async fn reconcile_many(
        &self,
        user_id: &str,
        transaction_ids: Vec<String>,
        method: AccountingMethod,
    ) -> Result<BulkReconcileResult>;
    async fn clear_all(&self, user_id: &str) -> Result<()>;
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;
}
