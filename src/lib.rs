pub mod db;

pub mod constants;
pub mod crypto;
pub mod ledger;
pub mod reports;
pub mod transactions;

pub mod errors;
pub mod schema;
pub mod utils;

pub use errors::{Error, ErrorKind, Result};
pub use ledger::*;
pub use reports::*;
pub use transactions::*;
