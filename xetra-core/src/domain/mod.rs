//! Domain types for the Xetra daily-report pipeline.

pub mod ledger;
pub mod report;
pub mod trade;

pub use ledger::LedgerEntry;
pub use report::DailyReportRow;
pub use trade::TradeRow;

/// ISIN type alias
pub type Isin = String;
