pub(crate) mod ledger_errors;
pub(crate) mod ledger_model;
pub(crate) mod ledger_repository;
pub(crate) mod ledger_service;
pub(crate) mod ledger_traits;
pub(crate) mod selector;


pub use ledger_errors::LedgerError;
pub use ledger_model::{Allocation, AllocationDB, Lot, LotDB, NewLot, Term};
pub use ledger_repository::LedgerRepository;
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
pub use selector::{
    is_long_term, select_for_sale, AccountingMethod, LotConsumption, OpenLot, SaleSelection,
};
