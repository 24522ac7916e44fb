use rust_decimal::Decimal;

/// The single asset this ledger tracks.
pub const ASSET_SYMBOL: &str = "BTC";

/// Quantity threshold for significant lot balances (one satoshi).
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Holding period, in days, strictly beyond which a disposal is long-term.
pub const LONG_TERM_HOLDING_DAYS: i64 = 365;

/// Decimal precision for ledger calculations
pub const DECIMAL_PRECISION: u32 = 8;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

lazy_static::lazy_static! {
    /// `QUANTITY_THRESHOLD` parsed once as a `Decimal`.
    pub static ref QUANTITY_EPSILON: Decimal = Decimal::new(1, 8);
}

/// Returns true when `quantity` is large enough to matter for lot accounting.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    quantity.abs() >= *QUANTITY_EPSILON
}
