//! Pipeline orchestration — extract, transform, load, commit.
//!
//! One run walks the phases in order and stops at the first failure:
//! 1. Reconcile the requested start date against the ledger.
//! 2. Extract every source object for the reconciled dates.
//! 3. Aggregate into the daily report with the reconciled cutoff.
//! 4. Write the report object to the target bucket.
//! 5. Only after a confirmed write, append the processed dates to the ledger.
//!
//! The commit-after-write ordering is the idempotency guarantee: a failure
//! anywhere before the commit leaves the ledger stale, and the next run's
//! reconciliation re-derives and re-extracts the unprocessed dates. An empty
//! reconciled date list is a successful no-op, not an error.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::info;
use xetra_core::aggregate;
use xetra_core::domain::{DailyReportRow, TradeRow};
use xetra_core::schema::DATE_FORMAT;

use crate::config::EtlConfig;
use crate::ledger::{self, LedgerError};
use crate::storage::{BlobStore, StorageError};
use crate::tables::{self, TableError};

/// Errors that terminate a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("extract failed: {0}")]
    Extract(StorageError),

    #[error("failed to decode source object '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: TableError,
    },

    #[error("failed to encode report: {0}")]
    Encode(TableError),

    #[error("report write failed, ledger not advanced: {0}")]
    Load(StorageError),
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// First date that needed processing (sentinel date when none did).
    pub min_date: NaiveDate,
    /// Dates extracted, including the lag seed day.
    pub extracted_dates: Vec<NaiveDate>,
    /// Report rows written.
    pub rows_written: usize,
    /// Key of the written report object, when one was written.
    pub target_key: Option<String>,
    /// Dates appended to the ledger.
    pub committed_dates: Vec<NaiveDate>,
}

impl RunSummary {
    /// True when the run found nothing to process.
    pub fn is_no_op(&self) -> bool {
        self.target_key.is_none() && self.committed_dates.is_empty()
    }

    fn no_op(min_date: NaiveDate) -> Self {
        Self {
            min_date,
            extracted_dates: Vec::new(),
            rows_written: 0,
            target_key: None,
            committed_dates: Vec::new(),
        }
    }
}

/// The daily-report ETL pipeline.
pub struct Pipeline<'a> {
    source: &'a dyn BlobStore,
    target: &'a dyn BlobStore,
    config: &'a EtlConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn BlobStore, target: &'a dyn BlobStore, config: &'a EtlConfig) -> Self {
        Self {
            source,
            target,
            config,
        }
    }

    /// Run one complete extract-transform-load-commit cycle.
    ///
    /// `today` bounds the reconciled calendar; `now` stamps the report key
    /// and the ledger entries. Both are passed in so runs are reproducible
    /// under test.
    pub fn run(&self, today: NaiveDate, now: NaiveDateTime) -> Result<RunSummary, PipelineError> {
        let ledger_dates = ledger::read_dates(self.target, &self.config.meta.key)?;
        let rec = xetra_core::reconcile(
            self.config.source.first_extract_date,
            today,
            ledger_dates.as_ref(),
        );

        if rec.is_up_to_date() {
            info!("ledger already covers the requested range, nothing to do");
            return Ok(RunSummary::no_op(rec.min_date));
        }
        info!(
            min_date = %rec.min_date,
            dates = rec.dates.len(),
            "reconciled extraction range"
        );

        let raw_rows = self.extract(&rec.dates)?;
        let report = self.transform(&raw_rows, rec.min_date);
        let target_key = self.load(&report, now)?;

        // Commit strictly after the confirmed write. Dates below min_date
        // were pulled in only to seed the lag and are not recorded.
        let committed_dates: Vec<NaiveDate> = rec
            .dates
            .iter()
            .copied()
            .filter(|d| *d >= rec.min_date)
            .collect();
        ledger::append(self.target, &self.config.meta.key, &committed_dates, now)?;

        info!(key = %target_key, rows = report.len(), "pipeline run complete");
        Ok(RunSummary {
            min_date: rec.min_date,
            extracted_dates: rec.dates,
            rows_written: report.len(),
            target_key: Some(target_key),
            committed_dates,
        })
    }

    /// Read and decode every source object for the given dates.
    fn extract(&self, dates: &[NaiveDate]) -> Result<Vec<TradeRow>, PipelineError> {
        let mut keys = Vec::new();
        for date in dates {
            let prefix = date.format(DATE_FORMAT).to_string();
            keys.extend(self.source.list(&prefix).map_err(PipelineError::Extract)?);
        }

        if keys.is_empty() {
            info!("no source objects for the reconciled dates");
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        for key in &keys {
            let bytes = self.source.get(key).map_err(PipelineError::Extract)?;
            let decoded = tables::read_trades_csv(&bytes, &self.config.source.columns).map_err(
                |source| PipelineError::Decode {
                    key: key.clone(),
                    source,
                },
            )?;
            rows.extend(decoded);
        }
        info!(objects = keys.len(), rows = rows.len(), "extracted source data");
        Ok(rows)
    }

    /// Aggregate raw rows into report rows, dropping dates before the cutoff.
    fn transform(&self, rows: &[TradeRow], cutoff: NaiveDate) -> Vec<DailyReportRow> {
        if rows.is_empty() {
            info!("nothing extracted, skipping aggregation");
            return Vec::new();
        }
        let report = aggregate::transform_with(rows, cutoff, self.config.target.lag_reference);
        info!(rows = report.len(), "aggregated daily report");
        report
    }

    /// Serialize and write the report object; returns the written key.
    fn load(&self, report: &[DailyReportRow], now: NaiveDateTime) -> Result<String, PipelineError> {
        let format = self.config.target.format;
        let key = format!(
            "{}_{}.{}",
            self.config.target.key_prefix,
            now.format(&self.config.target.key_date_format),
            format.extension()
        );

        let bytes = tables::write_report(report, &self.config.target.columns, format)
            .map_err(PipelineError::Encode)?;
        self.target.put(&key, &bytes).map_err(PipelineError::Load)?;

        info!(key = %key, bytes = bytes.len(), "report written");
        Ok(key)
    }
}
