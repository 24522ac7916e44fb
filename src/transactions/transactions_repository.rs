use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{get_connection, DbPool, DbTransactionExecutor};
use crate::schema::{allocations, lots, transactions};
use crate::transactions::transactions_errors::TransactionError;
use crate::transactions::transactions_model::*;
use crate::Result;

/// Repository for transaction rows.
pub struct TransactionRepository {
    pool: Arc<DbPool>,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl super::transactions_traits::TransactionRepositoryTrait for TransactionRepository {
    fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        let mut transaction_db: TransactionDB = new_transaction.into();
        if transaction_db.id.is_empty() {
            transaction_db.id = Uuid::new_v4().to_string();
        }

        let inserted = diesel::insert_into(transactions::table)
            .values(&transaction_db)
            .get_result::<TransactionDB>(&mut conn)
            .map_err(TransactionError::from)?;
        Ok(Transaction::from(inserted))
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        let row = transactions::table
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .map_err(TransactionError::from)?;
        Ok(Transaction::from(row))
    }

    fn get_transactions_by_user_id(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .select(TransactionDB::as_select())
            .order((transactions::event_date.asc(), transactions::created_at.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(TransactionError::from)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    fn get_transactions_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::event_date.lt(cutoff.naive_utc()))
            .select(TransactionDB::as_select())
            .order((transactions::event_date.asc(), transactions::created_at.asc()))
            .load::<TransactionDB>(&mut conn)
            .map_err(TransactionError::from)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    fn set_lot_status(&self, transaction_id: &str, status: LotStatus) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(transactions::table.find(transaction_id))
            .set((
                transactions::lot_status.eq(status.as_str()),
                transactions::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(TransactionError::from)?;
        Ok(())
    }

    fn clear_all(&self, user_id: &str) -> Result<()> {
        self.pool.execute(|conn| -> Result<()> {
            diesel::delete(allocations::table.filter(allocations::user_id.eq(user_id)))
                .execute(conn)
                .map_err(TransactionError::from)?;
            diesel::delete(lots::table.filter(lots::user_id.eq(user_id)))
                .execute(conn)
                .map_err(TransactionError::from)?;
            diesel::delete(transactions::table.filter(transactions::user_id.eq(user_id)))
                .execute(conn)
                .map_err(TransactionError::from)?;
            Ok(())
        })
    }
}
