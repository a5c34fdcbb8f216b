//! Processing ledger — the persisted record of already-handled source dates.
//!
//! The ledger is a two-column CSV object (`source_date`,
//! `datetime_of_processing`). It is append-only: committing a run re-reads
//! the existing object, concatenates the new entries, and writes the whole
//! table back. Duplicate source dates are allowed to accumulate; readers
//! reduce to a date set. A ledger object whose header differs from the
//! expected schema indicates corruption and is a hard failure.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::info;
use xetra_core::domain::LedgerEntry;
use xetra_core::schema::{
    DATE_FORMAT, LEDGER_PROCESSED_AT_COL, LEDGER_SOURCE_DATE_COL, PROCESSED_AT_FORMAT,
};

use crate::storage::{BlobStore, StorageError};

/// Errors from ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger at '{key}' does not match the expected two-column schema")]
    SchemaMismatch { key: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush: {0}")]
    Flush(String),
}

/// Read all ledger entries. `Ok(None)` when no ledger object exists yet.
pub fn read_entries(
    store: &dyn BlobStore,
    key: &str,
) -> Result<Option<Vec<LedgerEntry>>, LedgerError> {
    let bytes = match store.get(key) {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound { .. }) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    parse_entries(&bytes, key).map(Some)
}

/// Read the distinct set of recorded source dates.
///
/// `Ok(None)` triggers the reconciler's first-run branch.
pub fn read_dates(
    store: &dyn BlobStore,
    key: &str,
) -> Result<Option<BTreeSet<NaiveDate>>, LedgerError> {
    Ok(read_entries(store, key)?
        .map(|entries| entries.iter().map(|e| e.source_date).collect()))
}

/// Append newly processed dates to the ledger.
///
/// An empty `dates` slice is a no-op: nothing is written and `false` is
/// returned. Otherwise the existing entries (schema-checked) are preserved
/// and one new entry per date is appended with the given processing
/// timestamp.
pub fn append(
    store: &dyn BlobStore,
    key: &str,
    dates: &[NaiveDate],
    processed_at: NaiveDateTime,
) -> Result<bool, LedgerError> {
    if dates.is_empty() {
        info!(key, "no dates to commit, ledger left untouched");
        return Ok(false);
    }

    let mut entries = read_entries(store, key)?.unwrap_or_default();
    entries.extend(dates.iter().map(|&source_date| LedgerEntry {
        source_date,
        processed_at,
    }));

    store.put(key, &serialize_entries(&entries)?)?;
    info!(key, appended = dates.len(), total = entries.len(), "ledger updated");
    Ok(true)
}

fn parse_entries(bytes: &[u8], key: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
    let mismatch = || LedgerError::SchemaMismatch {
        key: key.to_string(),
    };

    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();

    // Order-independent comparison, same as the historical Counter check.
    let expected: BTreeSet<&str> = [LEDGER_SOURCE_DATE_COL, LEDGER_PROCESSED_AT_COL].into();
    let found: BTreeSet<&str> = headers.iter().collect();
    if headers.len() != expected.len() || found != expected {
        return Err(mismatch());
    }

    let date_idx = headers
        .iter()
        .position(|h| h == LEDGER_SOURCE_DATE_COL)
        .ok_or_else(mismatch)?;
    let processed_idx = headers
        .iter()
        .position(|h| h == LEDGER_PROCESSED_AT_COL)
        .ok_or_else(mismatch)?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let source_date = record
            .get(date_idx)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
            .ok_or_else(mismatch)?;
        let processed_at = record
            .get(processed_idx)
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), PROCESSED_AT_FORMAT).ok())
            .ok_or_else(mismatch)?;
        entries.push(LedgerEntry {
            source_date,
            processed_at,
        });
    }
    Ok(entries)
}

fn serialize_entries(entries: &[LedgerEntry]) -> Result<Vec<u8>, LedgerError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([LEDGER_SOURCE_DATE_COL, LEDGER_PROCESSED_AT_COL])?;
    for entry in entries {
        wtr.write_record([
            entry.source_date.format(DATE_FORMAT).to_string(),
            entry.processed_at.format(PROCESSED_AT_FORMAT).to_string(),
        ])?;
    }
    wtr.into_inner().map_err(|e| LedgerError::Flush(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemBlobStore;

    const KEY: &str = "meta.csv";

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 14)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
    }

    #[test]
    fn absent_ledger_reads_as_none() {
        let store = MemBlobStore::new();
        assert_eq!(read_dates(&store, KEY).unwrap(), None);
    }

    #[test]
    fn first_append_creates_the_ledger() {
        let store = MemBlobStore::new();
        assert!(append(&store, KEY, &[d("2022-05-12")], now()).unwrap());

        let dates = read_dates(&store, KEY).unwrap().unwrap();
        assert_eq!(dates, [d("2022-05-12")].into());
    }

    #[test]
    fn append_preserves_existing_entries() {
        // Ledger holds 2022-05-12/13; committing 05-01/02 must keep all four.
        let store = MemBlobStore::new();
        append(&store, KEY, &[d("2022-05-12"), d("2022-05-13")], now()).unwrap();
        append(&store, KEY, &[d("2022-05-01"), d("2022-05-02")], now()).unwrap();

        let dates = read_dates(&store, KEY).unwrap().unwrap();
        assert_eq!(
            dates,
            [
                d("2022-05-01"),
                d("2022-05-02"),
                d("2022-05-12"),
                d("2022-05-13"),
            ]
            .into()
        );
    }

    #[test]
    fn duplicate_dates_accumulate_but_read_as_a_set() {
        let store = MemBlobStore::new();
        append(&store, KEY, &[d("2022-05-12")], now()).unwrap();
        append(&store, KEY, &[d("2022-05-12")], now()).unwrap();

        let entries = read_entries(&store, KEY).unwrap().unwrap();
        assert_eq!(entries.len(), 2);
        let dates = read_dates(&store, KEY).unwrap().unwrap();
        assert_eq!(dates.len(), 1);
    }

    #[test]
    fn empty_date_list_is_a_no_op() {
        let store = MemBlobStore::new();
        assert!(!append(&store, KEY, &[], now()).unwrap());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn wrong_header_is_a_schema_mismatch() {
        let store = MemBlobStore::new();
        store
            .put(KEY, b"wrong_col,datetime_of_processing\n2022-05-12,2022-05-14 06:30:00\n")
            .unwrap();

        let err = read_dates(&store, KEY).unwrap_err();
        assert!(matches!(err, LedgerError::SchemaMismatch { .. }));
    }

    #[test]
    fn header_order_does_not_matter() {
        let store = MemBlobStore::new();
        store
            .put(KEY, b"datetime_of_processing,source_date\n2022-05-14 06:30:00,2022-05-12\n")
            .unwrap();

        let dates = read_dates(&store, KEY).unwrap().unwrap();
        assert_eq!(dates, [d("2022-05-12")].into());
    }

    #[test]
    fn unparseable_date_cell_is_a_schema_mismatch() {
        let store = MemBlobStore::new();
        store
            .put(KEY, b"source_date,datetime_of_processing\n12.05.2022,2022-05-14 06:30:00\n")
            .unwrap();

        let err = read_dates(&store, KEY).unwrap_err();
        assert!(matches!(err, LedgerError::SchemaMismatch { .. }));
    }

    #[test]
    fn appending_to_corrupt_ledger_fails_before_writing() {
        let store = MemBlobStore::new();
        store.put(KEY, b"bad,header\nx,y\n").unwrap();

        let err = append(&store, KEY, &[d("2022-05-12")], now()).unwrap_err();
        assert!(matches!(err, LedgerError::SchemaMismatch { .. }));
        // Original object untouched.
        assert_eq!(store.get(KEY).unwrap(), b"bad,header\nx,y\n");
    }
}
