use chrono::{DateTime, Utc};
use diesel::dsl::sum;
use diesel::prelude::*;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{is_quantity_significant, QUANTITY_THRESHOLD};
use crate::db::{get_connection, DbPool, DbTransactionExecutor};
use crate::ledger::ledger_errors::LedgerError;
use crate::ledger::ledger_model::*;
use crate::ledger::ledger_traits::LedgerRepositoryTrait;
use crate::ledger::selector::SaleSelection;
use crate::schema::{allocations, lots};
use crate::Result;

/// Repository for lot and allocation rows.
pub struct LedgerRepository {
    pool: Arc<DbPool>,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl LedgerRepositoryTrait for LedgerRepository {
    fn get_lot_by_tx_id(&self, tx_id: &str) -> Result<Option<Lot>> {
        let mut conn = get_connection(&self.pool)?;

        let lot = lots::table
            .filter(lots::tx_id.eq(tx_id))
            .select(LotDB::as_select())
            .first::<LotDB>(&mut conn)
            .optional()
            .map_err(LedgerError::from)?;
        Ok(lot.map(Lot::from))
    }

    fn get_lots_by_user_id(&self, user_id: &str) -> Result<Vec<Lot>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = lots::table
            .filter(lots::user_id.eq(user_id))
            .select(LotDB::as_select())
            .order(lots::opened_at.asc())
            .load::<LotDB>(&mut conn)
            .map_err(LedgerError::from)?;
        Ok(rows.into_iter().map(Lot::from).collect())
    }

    fn get_open_lots(&self, user_id: &str) -> Result<Vec<Lot>> {
        let mut conn = get_connection(&self.pool)?;

        let threshold = f64::from_str(QUANTITY_THRESHOLD).unwrap_or(1e-8);
        let rows = lots::table
            .filter(lots::user_id.eq(user_id))
            .filter(lots::remaining_qty.gt(threshold))
            .select(LotDB::as_select())
            .order(lots::opened_at.asc())
            .load::<LotDB>(&mut conn)
            .map_err(LedgerError::from)?;
        Ok(rows.into_iter().map(Lot::from).collect())
    }

    fn create_lot(&self, new_lot: NewLot) -> Result<Lot> {
        let mut conn = get_connection(&self.pool)?;

        let mut lot_db: LotDB = new_lot.into();
        lot_db.id = Uuid::new_v4().to_string();

        let inserted = diesel::insert_into(lots::table)
            .values(&lot_db)
            .get_result::<LotDB>(&mut conn)
            .map_err(LedgerError::from)?;
        Ok(Lot::from(inserted))
    }

    fn has_allocations_for_tx(&self, tx_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        let count: i64 = allocations::table
            .filter(allocations::tx_id.eq(tx_id))
            .count()
            .get_result(&mut conn)
            .map_err(LedgerError::from)?;
        Ok(count > 0)
    }

    fn get_allocations_for_tx(&self, tx_id: &str) -> Result<Vec<Allocation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = allocations::table
            .filter(allocations::tx_id.eq(tx_id))
            .select(AllocationDB::as_select())
            .order(allocations::created_at.asc())
            .load::<AllocationDB>(&mut conn)
            .map_err(LedgerError::from)?;
        Ok(rows.into_iter().map(Allocation::from).collect())
    }

    fn get_allocations_for_lot(&self, lot_id: &str) -> Result<Vec<Allocation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = allocations::table
            .filter(allocations::lot_id.eq(lot_id))
            .select(AllocationDB::as_select())
            .order(allocations::created_at.asc())
            .load::<AllocationDB>(&mut conn)
            .map_err(LedgerError::from)?;
        Ok(rows.into_iter().map(Allocation::from).collect())
    }

    fn apply_sale(
        &self,
        user_id: &str,
        tx_id: &str,
        selection: &SaleSelection,
        sale_date: DateTime<Utc>,
    ) -> Result<usize> {
        self.pool.execute(|conn| -> Result<usize> {
            let now = Utc::now().naive_utc();

            for consumption in &selection.consumptions {
                let lot_db = lots::table
                    .find(&consumption.lot_id)
                    .first::<LotDB>(conn)
                    .map_err(LedgerError::from)?;

                let remaining =
                    Decimal::from_f64_retain(lot_db.remaining_qty).unwrap_or_default();
                // Another sale may have consumed this lot between the
                // snapshot read and this transaction. Callers retry against
                // a fresh snapshot.
                if consumption.qty > remaining {
                    return Err(LedgerError::SnapshotConflict(format!(
                        "allocation of {} exceeds remaining {} on lot {}",
                        consumption.qty, remaining, consumption.lot_id
                    ))
                    .into());
                }

                let allocation = AllocationDB {
                    id: Uuid::new_v4().to_string(),
                    tx_id: tx_id.to_string(),
                    lot_id: consumption.lot_id.clone(),
                    user_id: user_id.to_string(),
                    qty: consumption.qty.to_f64().unwrap_or_default(),
                    cost_usd: consumption.cost_basis.to_f64().unwrap_or_default(),
                    proceeds_usd: consumption.proceeds.to_f64().unwrap_or_default(),
                    gain_usd: consumption.gain.to_f64().unwrap_or_default(),
                    is_long_term: consumption.is_long_term,
                    created_at: now,
                };
                diesel::insert_into(allocations::table)
                    .values(&allocation)
                    .execute(conn)
                    .map_err(LedgerError::from)?;

                let new_remaining = remaining - consumption.qty;
                if is_quantity_significant(&new_remaining) {
                    diesel::update(lots::table.find(&consumption.lot_id))
                        .set((
                            lots::remaining_qty.eq(new_remaining.to_f64().unwrap_or_default()),
                            lots::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(LedgerError::from)?;
                } else {
                    // Lot fully consumed: stamp the terminal summary so
                    // historical queries do not need to re-aggregate.
                    let (lot_proceeds, lot_gain): (Option<f64>, Option<f64>) = allocations::table
                        .filter(allocations::lot_id.eq(&consumption.lot_id))
                        .select((sum(allocations::proceeds_usd), sum(allocations::gain_usd)))
                        .first(conn)
                        .map_err(LedgerError::from)?;

                    // term covers the whole lot, so it is only stamped when
                    // every disposal shares one holding-period class; a lot
                    // sold partly short and partly long stays unclassified.
                    let lot_terms: Vec<bool> = allocations::table
                        .filter(allocations::lot_id.eq(&consumption.lot_id))
                        .select(allocations::is_long_term)
                        .load::<bool>(conn)
                        .map_err(LedgerError::from)?;
                    let term = if lot_terms.iter().all(|&long| long) {
                        Some(Term::Long.as_str().to_string())
                    } else if lot_terms.iter().all(|&long| !long) {
                        Some(Term::Short.as_str().to_string())
                    } else {
                        None
                    };

                    diesel::update(lots::table.find(&consumption.lot_id))
                        .set((
                            lots::remaining_qty.eq(0.0),
                            lots::closed_at.eq(Some(sale_date.naive_utc())),
                            lots::proceeds_usd.eq(lot_proceeds),
                            lots::gain_usd.eq(lot_gain),
                            lots::term.eq(term),
                            lots::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(LedgerError::from)?;
                }
            }

            Ok(selection.consumptions.len())
        })
    }
}
