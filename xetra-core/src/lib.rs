//! Xetra Core — domain types, watermark reconciliation, daily-report aggregation.
//!
//! This crate contains the algorithmic heart of the pipeline, free of any I/O:
//! - Domain types (raw trade rows, report rows, ledger entries)
//! - Schema contract (column mappings, date formats, file formats)
//! - Gap reconciliation against the processing ledger
//! - Grouped aggregation with lag-1 percent change
//!
//! Storage, serialization, and orchestration live in `xetra-runner`.

pub mod aggregate;
pub mod domain;
pub mod reconcile;
pub mod schema;

pub use aggregate::{transform, transform_with, LagReference};
pub use domain::{DailyReportRow, LedgerEntry, TradeRow};
pub use reconcile::{reconcile, Reconciliation};
pub use schema::{FileFormat, SourceColumns, TargetColumns, UnsupportedFormat};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn domain_types_are_send_sync() {
        assert_send::<TradeRow>();
        assert_sync::<TradeRow>();
        assert_send::<DailyReportRow>();
        assert_sync::<DailyReportRow>();
        assert_send::<LedgerEntry>();
        assert_sync::<LedgerEntry>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SourceColumns>();
        assert_sync::<SourceColumns>();
        assert_send::<TargetColumns>();
        assert_sync::<TargetColumns>();
        assert_send::<FileFormat>();
        assert_sync::<FileFormat>();
    }
}
