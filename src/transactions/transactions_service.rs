use log::{debug, error, info, warn};
use std::str::FromStr;
use std::sync::Arc;

use crate::crypto::TransactionCipher;
use crate::errors::ErrorKind;
use crate::ledger::{AccountingMethod, LedgerServiceTrait};
use crate::transactions::transactions_errors::TransactionError;
use crate::transactions::transactions_model::*;
use crate::transactions::transactions_traits::{
    TransactionRepositoryTrait, TransactionServiceTrait,
};
use crate::Result;

/// Service for processing transactions and their lot side effects
pub struct TransactionService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    ledger_service: Arc<dyn LedgerServiceTrait>,
    cipher: Arc<dyn TransactionCipher>,
}

impl TransactionService {
    /// Creates a new TransactionService instance with injected dependencies
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        ledger_service: Arc<dyn LedgerServiceTrait>,
        cipher: Arc<dyn TransactionCipher>,
    ) -> Self {
        Self {
            transaction_repository,
            ledger_service,
            cipher,
        }
    }

    /// Applies buy/sell lot side effects and records the resulting status.
    ///
    /// A rejected sale (insufficient lots or any other client-attributable
    /// failure) stamps `REJECTED`; infrastructure failures leave the status
    /// `PENDING` so a later reconcile can retry.
    fn apply_lot_effects(
        &self,
        transaction: &Transaction,
        method: AccountingMethod,
    ) -> Result<()> {
        let transaction_type = TransactionType::from_str(&transaction.transaction_type)
            .map_err(TransactionError::InvalidPayload)?;

        let outcome = match transaction_type {
            TransactionType::Buy => self.ledger_service.apply_buy(transaction),
            TransactionType::Sell => self.ledger_service.apply_sell(transaction, method),
        };

        match outcome {
            Ok(()) => {
                self.transaction_repository
                    .set_lot_status(&transaction.id, LotStatus::Applied)?;
                Ok(())
            }
            Err(err) => {
                if err.kind() == ErrorKind::BadRequest {
                    warn!(
                        "Lot application rejected for transaction {}: {}",
                        transaction.id, err
                    );
                    self.transaction_repository
                        .set_lot_status(&transaction.id, LotStatus::Rejected)?;
                } else {
                    error!(
                        "Lot application failed for transaction {}: {}",
                        transaction.id, err
                    );
                }
                Err(err)
            }
        }
    }

    fn decrypt_payload(
        &self,
        envelope: &NewTransactionEnvelope,
        session: &SessionContext,
    ) -> Result<TransactionPayload> {
        let (passphrase, salt) = session.secrets()?;
        envelope.validate()?;

        let key = self.cipher.derive_key(passphrase, salt);
        let plaintext = self.cipher.decrypt(&envelope.ciphertext, &key)?;

        let payload: TransactionPayload = serde_json::from_str(&plaintext)
            .map_err(|e| TransactionError::InvalidPayload(format!("Malformed JSON: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn process_transaction(
        &self,
        envelope: NewTransactionEnvelope,
        session: &SessionContext,
    ) -> Result<String> {
        let payload = self.decrypt_payload(&envelope, session)?;
        let event_date = payload.event_date()?;

        // The transaction record is written before any lot side effects, so
        // the economic event survives even a rejected sale.
        let transaction = self.transaction_repository.create_transaction(NewTransaction {
            id: None,
            user_id: session.user_id.clone(),
            transaction_type: payload.transaction_type.clone(),
            event_date,
            amount: payload.amount,
            price: payload.price,
            payload: envelope.ciphertext,
        })?;
        debug!(
            "Persisted {} transaction {} for user {}",
            transaction.transaction_type, transaction.id, transaction.user_id
        );

        self.apply_lot_effects(&transaction, AccountingMethod::default())?;

        Ok(transaction.id)
    }

    async fn reconcile_many(
        &self,
        user_id: &str,
        transaction_ids: Vec<String>,
        method: AccountingMethod,
    ) -> Result<BulkReconcileResult> {
        let mut result = BulkReconcileResult::default();

        for tx_id in transaction_ids {
            let transaction = match self.transaction_repository.get_transaction(&tx_id) {
                Ok(tx) if tx.user_id == user_id => tx,
                Ok(_) => {
                    result.errors.push(BulkReconcileError {
                        tx_id,
                        message: "Transaction belongs to another user".to_string(),
                    });
                    continue;
                }
                Err(err) => {
                    result.errors.push(BulkReconcileError {
                        tx_id,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            // One bad row must not abort the rest of the batch.
            match self.apply_lot_effects(&transaction, method) {
                Ok(()) => result.processed += 1,
                Err(err) => result.errors.push(BulkReconcileError {
                    tx_id: transaction.id,
                    message: err.to_string(),
                }),
            }
        }

        info!(
            "Reconciled {} transaction(s) for user {}, {} error(s)",
            result.processed,
            user_id,
            result.errors.len()
        );
        Ok(result)
    }

    async fn clear_all(&self, user_id: &str) -> Result<()> {
        self.transaction_repository.clear_all(user_id)?;
        info!("Cleared all ledger data for user {}", user_id);
        Ok(())
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.transaction_repository.get_transaction(transaction_id)
    }

    fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.transaction_repository
            .get_transactions_by_user_id(user_id)
    }
}
