pub(crate) mod reports_errors;
pub(crate) mod reports_model;
pub(crate) mod reports_service;
pub(crate) mod reports_traits;

#[cfg(test)]
mod reports_service_tests;

pub use reports_errors::ReportError;
pub use reports_model::{LotBreakdown, OpenLotSummary, SaleReportEntry, SaleTerm, TaxReport};
pub use reports_service::TaxReportService;
pub use reports_traits::TaxReportServiceTrait;
