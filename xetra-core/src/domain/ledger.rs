//! LedgerEntry — one processed-date record in the append-only ledger.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the processing ledger: which source date was handled, and when.
///
/// The ledger is append-only and may accumulate duplicate source dates;
/// consumers must reconcile against the *set* of recorded dates, never
/// against row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub source_date: NaiveDate,
    pub processed_at: NaiveDateTime,
}
