#[cfg(test)]
mod tests {
    use crate::errors::ErrorKind;
    use crate::reports::reports_errors::ReportError;
    use crate::reports::reports_model::SaleTerm;
    use crate::reports::reports_service::TaxReportService;
    use crate::reports::reports_traits::TaxReportServiceTrait;
    use crate::transactions::transactions_errors::TransactionError;
    use crate::transactions::{
        LotStatus, NewTransaction, Transaction, TransactionRepositoryTrait,
    };
    use crate::{Error, Result};
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    // --- Mock TransactionRepository backed by a fixed history ---
    struct FixedHistoryRepository {
        transactions: Vec<Transaction>,
    }

    impl FixedHistoryRepository {
        fn new(transactions: Vec<Transaction>) -> Arc<Self> {
            Arc::new(Self { transactions })
        }
    }

    impl TransactionRepositoryTrait for FixedHistoryRepository {
        fn create_transaction(&self, _new_transaction: NewTransaction) -> Result<Transaction> {
            unimplemented!("read-only fixture")
        }

        fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
            self.transactions
                .iter()
                .find(|t| t.id == transaction_id)
                .cloned()
                .ok_or_else(|| {
                    Error::Transaction(TransactionError::NotFound(transaction_id.to_string()))
                })
        }

        fn get_transactions_by_user_id(&self, user_id: &str) -> Result<Vec<Transaction>> {
            let mut transactions: Vec<Transaction> = self
                .transactions
                .iter()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            transactions.sort_by_key(|t| t.event_date);
            Ok(transactions)
        }

        fn get_transactions_before(
            &self,
            user_id: &str,
            cutoff: DateTime<Utc>,
        ) -> Result<Vec<Transaction>> {
            let mut transactions: Vec<Transaction> = self
                .transactions
                .iter()
                .filter(|t| t.user_id == user_id && t.event_date < cutoff)
                .cloned()
                .collect();
            transactions.sort_by_key(|t| t.event_date);
            Ok(transactions)
        }

        fn set_lot_status(&self, _transaction_id: &str, _status: LotStatus) -> Result<()> {
            unimplemented!("read-only fixture")
        }

        fn clear_all(&self, _user_id: &str) -> Result<()> {
            unimplemented!("read-only fixture")
        }
    }

    // --- Helpers ---
    fn ts(date_str: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}T12:00:00Z", date_str))
            .unwrap()
            .with_timezone(&Utc)
    }

    fn transaction(
        id: &str,
        transaction_type: &str,
        date_str: &str,
        amount: Decimal,
        price: Decimal,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            transaction_type: transaction_type.to_string(),
            event_date: ts(date_str),
            amount,
            price,
            payload: String::new(),
            lot_status: "APPLIED".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(transactions: Vec<Transaction>) -> TaxReportService {
        TaxReportService::new(FixedHistoryRepository::new(transactions))
    }

    #[test]
    fn test_year_report_splits_short_and_long_term_gains() {
        let service = service(vec![
            transaction("buy-1", "buy", "2023-01-01", dec!(1.0), dec!(20000)),
            transaction("buy-2", "buy", "2023-06-01", dec!(1.0), dec!(50000)),
            transaction("sell-1", "sell", "2024-02-01", dec!(1.2), dec!(60000)),
        ]);

        let report = service.generate("user-1", 2024, dec!(55000)).unwrap();

        assert_eq!(report.year, 2024);
        assert_eq!(report.realized_gain_st, dec!(10000));
        assert_eq!(report.realized_gain_lt, dec!(8000));
        assert_eq!(report.total_realized_gain, dec!(18000));

        assert_eq!(report.details.len(), 1);
        let sale = &report.details[0];
        assert_eq!(sale.tx_id, "sell-1");
        assert_eq!(sale.term, SaleTerm::Mixed);
        assert_eq!(sale.proceeds, dec!(72000));
        assert_eq!(sale.cost_basis, dec!(54000));
        assert_eq!(sale.gain, dec!(18000));
        // HIFO: the 50k lot is consumed before the 20k lot.
        assert_eq!(sale.lots.len(), 2);
        assert_eq!(sale.lots[0].lot_id, "buy-2");
        assert_eq!(sale.lots[0].qty, dec!(1.0));
        assert_eq!(sale.lots[1].lot_id, "buy-1");
        assert_eq!(sale.lots[1].qty, dec!(0.2));

        assert_eq!(report.open_lots.len(), 1);
        let open = &report.open_lots[0];
        assert_eq!(open.lot_id, "buy-1");
        assert_eq!(open.remaining_qty, dec!(0.8));
        assert_eq!(open.unit_cost, dec!(20000));
        assert_eq!(open.unrealized_gain, dec!(28000));
        assert_eq!(report.total_unrealized_gain, dec!(28000));
    }

    #[test]
    fn test_prior_year_sales_consume_inventory_but_stay_out_of_totals() {
        let service = service(vec![
            transaction("buy-1", "buy", "2022-03-01", dec!(2.0), dec!(10000)),
            transaction("sell-2022", "sell", "2022-12-01", dec!(1.0), dec!(15000)),
            transaction("sell-2023", "sell", "2023-06-01", dec!(0.5), dec!(20000)),
        ]);

        let report = service.generate("user-1", 2023, dec!(20000)).unwrap();

        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].tx_id, "sell-2023");
        assert_eq!(report.realized_gain_st, dec!(0));
        assert_eq!(report.realized_gain_lt, dec!(5000));
        assert_eq!(report.total_realized_gain, dec!(5000));
        // The 2022 sale already took 1.0 BTC out of the lot.
        assert_eq!(report.open_lots.len(), 1);
        assert_eq!(report.open_lots[0].remaining_qty, dec!(0.5));
    }

    #[test]
    fn test_transactions_after_report_year_are_ignored() {
        let service = service(vec![
            transaction("buy-1", "buy", "2024-03-01", dec!(1.0), dec!(40000)),
            transaction("sell-2025", "sell", "2025-02-01", dec!(1.0), dec!(90000)),
        ]);

        let report = service.generate("user-1", 2024, dec!(50000)).unwrap();

        assert!(report.details.is_empty());
        assert_eq!(report.total_realized_gain, dec!(0));
        assert_eq!(report.open_lots.len(), 1);
        assert_eq!(report.open_lots[0].remaining_qty, dec!(1.0));
    }

    #[test]
    fn test_replay_is_scoped_per_user() {
        let mut other = transaction("buy-other", "buy", "2023-01-01", dec!(5.0), dec!(1000));
        other.user_id = "user-2".to_string();
        let service = service(vec![
            other,
            transaction("buy-1", "buy", "2023-02-01", dec!(1.0), dec!(30000)),
        ]);

        let report = service.generate("user-1", 2023, dec!(30000)).unwrap();

        assert_eq!(report.open_lots.len(), 1);
        assert_eq!(report.open_lots[0].lot_id, "buy-1");
    }

    #[test]
    fn test_oversold_history_aborts_the_report() {
        let service = service(vec![
            transaction("buy-1", "buy", "2023-01-01", dec!(1.0), dec!(20000)),
            transaction("sell-1", "sell", "2023-06-01", dec!(2.0), dec!(30000)),
        ]);

        let err = service.generate("user-1", 2023, dec!(30000)).unwrap_err();

        match err {
            Error::Report(ReportError::ReplayFailed { ref tx_id, .. }) => {
                assert_eq!(tx_id, "sell-1")
            }
            ref other => panic!("expected ReplayFailed, got {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_unknown_transaction_type_aborts_the_report() {
        let service = service(vec![transaction(
            "tx-bad",
            "airdrop",
            "2023-01-01",
            dec!(1.0),
            dec!(20000),
        )]);

        let err = service.generate("user-1", 2023, dec!(30000)).unwrap_err();
        assert!(matches!(
            err,
            Error::Report(ReportError::ReplayFailed { .. })
        ));
    }

    #[test]
    fn test_rejected_sells_are_skipped_during_replay() {
        let mut oversell = transaction("sell-bad", "sell", "2023-06-01", dec!(5.0), dec!(30000));
        oversell.lot_status = "REJECTED".to_string();
        let service = service(vec![
            transaction("buy-1", "buy", "2023-01-01", dec!(1.0), dec!(20000)),
            oversell,
            transaction("sell-good", "sell", "2023-09-01", dec!(0.5), dec!(40000)),
        ]);

        let report = service.generate("user-1", 2023, dec!(40000)).unwrap();

        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].tx_id, "sell-good");
        assert_eq!(report.realized_gain_st, dec!(10000));
        assert_eq!(report.total_realized_gain, dec!(10000));
        assert_eq!(report.open_lots.len(), 1);
        assert_eq!(report.open_lots[0].remaining_qty, dec!(0.5));
    }

    #[test]
    fn test_report_is_reproducible() {
        let history = vec![
            transaction("buy-1", "buy", "2023-01-01", dec!(1.0), dec!(20000)),
            transaction("buy-2", "buy", "2023-06-01", dec!(1.0), dec!(50000)),
            transaction("sell-1", "sell", "2024-02-01", dec!(1.2), dec!(60000)),
        ];
        let service = service(history);

        let first = service.generate("user-1", 2024, dec!(55000)).unwrap();
        let second = service.generate("user-1", 2024, dec!(55000)).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_year_is_rejected() {
        let service = service(Vec::new());
        let err = service.generate("user-1", 300000, dec!(30000)).unwrap_err();

        assert!(matches!(err, Error::Report(ReportError::InvalidYear(_))));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
