//! Daily-report aggregation — raw trade rows in, one row per (ISIN, date) out.
//!
//! Grouping is an explicit map keyed by (ISIN, date), filled in a single scan
//! after a stable sort by time-of-day. This reproduces the grouped first/last
//! selection deterministically without a dataframe library:
//! - opening price = start price of the earliest row in the group
//! - closing price = start price of the latest row in the group
//! - min/max = group min of the min-price column, group max of the max-price column
//! - volume = group sum of the traded-volume column
//!
//! The lag-1 percent change is computed per ISIN over ascending dates, against
//! the previous date's reference price (opening by default, see [`LagReference`]).
//! All numeric outputs are rounded to 2 decimals, and rows whose date falls
//! before the cutoff (extracted only to seed the lag) are dropped at the end.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{DailyReportRow, TradeRow};

/// Which price of the previous date the percent change is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagReference {
    /// Previous date's opening price (canonical variant).
    #[default]
    Open,
    /// Previous date's closing price.
    Close,
}

/// Running per-group aggregate, filled in time order.
#[derive(Debug, Clone)]
struct GroupAcc {
    opening_price: f64,
    closing_price: f64,
    min_price: f64,
    max_price: f64,
    volume: f64,
}

/// Aggregate raw rows into the daily report, keeping dates `>= cutoff`.
///
/// Uses the default [`LagReference::Open`]. Empty input yields empty output.
pub fn transform(rows: &[TradeRow], cutoff: NaiveDate) -> Vec<DailyReportRow> {
    transform_with(rows, cutoff, LagReference::default())
}

/// Aggregate with an explicit lag reference.
pub fn transform_with(
    rows: &[TradeRow],
    cutoff: NaiveDate,
    lag: LagReference,
) -> Vec<DailyReportRow> {
    if rows.is_empty() {
        return Vec::new();
    }

    // Incomplete rows are excluded, not imputed.
    let mut complete: Vec<&TradeRow> = rows.iter().filter(|r| r.is_complete()).collect();

    // Stable sort by time so first/last selection within a group is
    // well-defined; ties keep input order.
    complete.sort_by_key(|r| r.time.unwrap_or(NaiveTime::MIN));

    // BTreeMap keys sort by (isin, date), which is exactly the order the
    // lag computation needs.
    let mut groups: BTreeMap<(String, NaiveDate), GroupAcc> = BTreeMap::new();
    for row in complete {
        let isin = row.isin.clone().unwrap_or_default();
        let date = row.date.unwrap_or_default();
        let start = row.start_price.unwrap_or_default();
        let min = row.min_price.unwrap_or_default();
        let max = row.max_price.unwrap_or_default();
        let vol = row.traded_volume.unwrap_or_default();

        groups
            .entry((isin, date))
            .and_modify(|acc| {
                acc.closing_price = start;
                acc.min_price = acc.min_price.min(min);
                acc.max_price = acc.max_price.max(max);
                acc.volume += vol;
            })
            .or_insert(GroupAcc {
                opening_price: start,
                closing_price: start,
                min_price: min,
                max_price: max,
                volume: vol,
            });
    }

    let mut report = Vec::with_capacity(groups.len());
    let mut prev: Option<(String, f64)> = None;

    for ((isin, date), acc) in groups {
        let reference = match lag {
            LagReference::Open => acc.opening_price,
            LagReference::Close => acc.closing_price,
        };
        let change = match &prev {
            Some((prev_isin, prev_ref)) if *prev_isin == isin => {
                Some(round2((acc.opening_price - prev_ref) / prev_ref * 100.0))
            }
            _ => None,
        };
        prev = Some((isin.clone(), reference));

        if date < cutoff {
            continue;
        }
        report.push(DailyReportRow {
            isin,
            date,
            opening_price: round2(acc.opening_price),
            closing_price: round2(acc.closing_price),
            min_price: round2(acc.min_price),
            max_price: round2(acc.max_price),
            daily_traded_volume: round2(acc.volume),
            change_prev_closing: change,
        });
    }

    report
}

/// Round half away from zero to 2 decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(
        isin: &str,
        date: &str,
        time: &str,
        start: f64,
        min: f64,
        max: f64,
        vol: f64,
    ) -> TradeRow {
        TradeRow {
            isin: Some(isin.into()),
            date: Some(d(date)),
            time: Some(time.parse().unwrap()),
            start_price: Some(start),
            end_price: Some(start),
            min_price: Some(min),
            max_price: Some(max),
            traded_volume: Some(vol),
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(transform(&[], d("2021-04-17")).is_empty());
    }

    #[test]
    fn single_day_aggregation_matches_reference_values() {
        let rows = vec![
            row("AT0000A0E9W5", "2021-04-17", "13:00:00", 20.21, 18.21, 20.42, 633.0),
            row("AT0000A0E9W5", "2021-04-17", "14:00:00", 18.27, 18.27, 21.34, 455.0),
        ];
        let report = transform(&rows, d("2021-04-17"));

        assert_eq!(report.len(), 1);
        let r = &report[0];
        assert_eq!(r.isin, "AT0000A0E9W5");
        assert_eq!(r.opening_price, 20.21);
        assert_eq!(r.closing_price, 18.27);
        assert_eq!(r.min_price, 18.21);
        assert_eq!(r.max_price, 21.34);
        assert_eq!(r.daily_traded_volume, 1088.0);
        assert_eq!(r.change_prev_closing, None);
    }

    #[test]
    fn opening_uses_earliest_time_regardless_of_input_order() {
        let rows = vec![
            row("DE0005140008", "2021-04-17", "15:30:00", 11.0, 10.9, 11.1, 100.0),
            row("DE0005140008", "2021-04-17", "08:00:00", 10.0, 9.9, 10.1, 100.0),
        ];
        let report = transform(&rows, d("2021-04-17"));
        assert_eq!(report[0].opening_price, 10.0);
        assert_eq!(report[0].closing_price, 11.0);
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let mut bad = row("DE0005140008", "2021-04-17", "09:00:00", 10.0, 9.9, 10.1, 50.0);
        bad.traded_volume = None;
        let good = row("DE0005140008", "2021-04-17", "10:00:00", 12.0, 11.9, 12.1, 75.0);
        let report = transform(&[bad, good], d("2021-04-17"));

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].opening_price, 12.0);
        assert_eq!(report[0].daily_traded_volume, 75.0);
    }

    #[test]
    fn lag_is_percent_change_of_openings() {
        let rows = vec![
            row("DE0005140008", "2021-04-15", "09:00:00", 100.0, 99.0, 101.0, 10.0),
            row("DE0005140008", "2021-04-16", "09:00:00", 110.0, 108.0, 112.0, 10.0),
            row("DE0005140008", "2021-04-17", "09:00:00", 99.0, 98.0, 100.0, 10.0),
        ];
        let report = transform(&rows, d("2021-04-15"));

        assert_eq!(report[0].change_prev_closing, None);
        assert_eq!(report[1].change_prev_closing, Some(10.0));
        assert_eq!(report[2].change_prev_closing, Some(-10.0));
    }

    #[test]
    fn lag_against_previous_close_when_configured() {
        let rows = vec![
            row("DE0005140008", "2021-04-15", "09:00:00", 100.0, 99.0, 101.0, 10.0),
            row("DE0005140008", "2021-04-15", "17:00:00", 104.0, 103.0, 105.0, 10.0),
            row("DE0005140008", "2021-04-16", "09:00:00", 130.0, 129.0, 131.0, 10.0),
        ];
        let report = transform_with(&rows, d("2021-04-15"), LagReference::Close);
        // (130 - 104) / 104 * 100 = 25.0
        assert_eq!(report[1].change_prev_closing, Some(25.0));
    }

    #[test]
    fn cutoff_drops_lag_seed_dates_but_keeps_their_effect() {
        let rows = vec![
            row("DE0005140008", "2021-04-16", "09:00:00", 100.0, 99.0, 101.0, 10.0),
            row("DE0005140008", "2021-04-17", "09:00:00", 103.0, 102.0, 104.0, 10.0),
        ];
        let report = transform(&rows, d("2021-04-17"));

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].date, d("2021-04-17"));
        // The 04-16 row is gone but still seeded the percent change.
        assert_eq!(report[0].change_prev_closing, Some(3.0));
    }

    #[test]
    fn lag_does_not_cross_isin_boundaries() {
        let rows = vec![
            row("AT0000A0E9W5", "2021-04-16", "09:00:00", 50.0, 49.0, 51.0, 10.0),
            row("DE0005140008", "2021-04-17", "09:00:00", 100.0, 99.0, 101.0, 10.0),
        ];
        let report = transform(&rows, d("2021-04-16"));
        // Each ISIN's first date has no predecessor.
        assert!(report.iter().all(|r| r.change_prev_closing.is_none()));
    }

    #[test]
    fn one_row_per_isin_date_pair() {
        let rows = vec![
            row("AT0000A0E9W5", "2021-04-17", "09:00:00", 1.0, 1.0, 1.0, 1.0),
            row("AT0000A0E9W5", "2021-04-17", "10:00:00", 2.0, 2.0, 2.0, 1.0),
            row("AT0000A0E9W5", "2021-04-17", "11:00:00", 3.0, 3.0, 3.0, 1.0),
        ];
        let report = transform(&rows, d("2021-04-17"));
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].daily_traded_volume, 3.0);
    }

    #[test]
    fn outputs_are_rounded_to_two_decimals() {
        let rows = vec![
            row("DE0005140008", "2021-04-16", "09:00:00", 3.0, 3.0, 3.0, 10.0),
            row("DE0005140008", "2021-04-17", "09:00:00", 4.0, 3.999, 4.001, 10.0),
        ];
        let report = transform(&rows, d("2021-04-16"));
        // (4 - 3) / 3 * 100 = 33.333...
        assert_eq!(report[1].change_prev_closing, Some(33.33));
        assert_eq!(report[1].min_price, 4.0);
    }
}
