//! TradeRow — one intraday trade snapshot as read from a source object.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Raw intraday snapshot for a single ISIN, straight off a source CSV.
///
/// Every field is optional because source cells can be blank: the
/// aggregation engine drops incomplete rows rather than imputing them.
/// Rows live only for the duration of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeRow {
    pub isin: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub start_price: Option<f64>,
    pub end_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub traded_volume: Option<f64>,
}

impl TradeRow {
    /// Returns true if every relevant field is present.
    ///
    /// Incomplete rows are excluded from aggregation, not imputed.
    pub fn is_complete(&self) -> bool {
        self.isin.is_some()
            && self.date.is_some()
            && self.time.is_some()
            && self.start_price.is_some()
            && self.end_price.is_some()
            && self.min_price.is_some()
            && self.max_price.is_some()
            && self.traded_volume.is_some()
    }
}
