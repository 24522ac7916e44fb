use rust_decimal::Decimal;

use super::reports_model::TaxReport;
use crate::Result;

/// Trait defining the contract for tax report generation.
pub trait TaxReportServiceTrait: Send + Sync {
    /// Replays the user's full transaction history and produces the
    /// year-scoped report. Read-only; never touches persisted lot state.
    fn generate(&self, user_id: &str, year: i32, current_price: Decimal) -> Result<TaxReport>;
}
