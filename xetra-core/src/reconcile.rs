//! Watermark reconciliation — which dates still need extraction.
//!
//! The ledger records which source dates have already been processed.
//! Reconciliation diffs a calendar sequence (one day before the requested
//! start date up to today) against the ledger's date set and derives the
//! minimal range that must be (re)extracted. It tolerates a fully missing
//! ledger (first run), interior gaps left by failed runs, and no-op reruns,
//! and always re-derives state from the ledger rather than trusting any
//! cached run metadata.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use crate::schema::sentinel_date;

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// First date that actually needs (re)processing. The sentinel date
    /// when the ledger already covers the whole requested range.
    pub min_date: NaiveDate,
    /// Every calendar date to extract, ascending. Includes one day before
    /// `min_date` so the lag-1 percent change has its reference row.
    pub dates: Vec<NaiveDate>,
}

impl Reconciliation {
    /// True when the ledger already covers everything up to today.
    pub fn is_up_to_date(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Compute the dates still requiring extraction.
///
/// `ledger_dates` is `None` when no ledger exists yet (first run ever);
/// otherwise it is the distinct set of dates the ledger records. `today`
/// is passed in explicitly so callers control the clock.
pub fn reconcile(
    start_date: NaiveDate,
    today: NaiveDate,
    ledger_dates: Option<&BTreeSet<NaiveDate>>,
) -> Reconciliation {
    let floor = start_date - Days::new(1);
    let calendar: Vec<NaiveDate> = calendar_sequence(floor, today);

    let Some(recorded) = ledger_dates else {
        // First run: everything strictly after the floor.
        return Reconciliation {
            min_date: start_date,
            dates: calendar.into_iter().skip(1).collect(),
        };
    };

    // Candidate dates are the calendar minus the floor day itself.
    let missing: BTreeSet<NaiveDate> = calendar
        .iter()
        .skip(1)
        .filter(|d| !recorded.contains(d))
        .copied()
        .collect();

    match missing.first() {
        Some(&first_missing) => {
            // Extract from one day before the first gap so the percent
            // change against its predecessor can be recomputed.
            let extraction_floor = first_missing - Days::new(1);
            Reconciliation {
                min_date: first_missing,
                dates: calendar
                    .into_iter()
                    .filter(|d| *d >= extraction_floor)
                    .collect(),
            }
        }
        None => Reconciliation {
            min_date: sentinel_date(),
            dates: Vec::new(),
        },
    }
}

/// Ascending inclusive calendar range; empty when `from > to`.
fn calendar_sequence(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut d = from;
    while d <= to {
        dates.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }
    dates
}
