/// Transaction type constants
pub const TRANSACTION_TYPE_BUY: &str = "buy";
pub const TRANSACTION_TYPE_SELL: &str = "sell";

/// Lot-processing status constants
pub const LOT_STATUS_PENDING: &str = "PENDING";
pub const LOT_STATUS_APPLIED: &str = "APPLIED";
pub const LOT_STATUS_REJECTED: &str = "REJECTED";
