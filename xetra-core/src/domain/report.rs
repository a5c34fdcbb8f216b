//! DailyReportRow — one aggregated report record per (ISIN, date).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One consolidated daily-report row.
///
/// Produced by the aggregation engine, handed to the sink, never mutated.
/// The engine guarantees at most one row per (isin, date) per batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReportRow {
    pub isin: String,
    pub date: NaiveDate,
    pub opening_price: f64,
    pub closing_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub daily_traded_volume: f64,
    /// Percent change versus the previous trading day's reference price.
    /// `None` for the first observed date of an ISIN.
    pub change_prev_closing: Option<f64>,
}
