//! Schema contract — column names, date formats, and file formats.
//!
//! Defines the fixed vocabulary shared by the source reader, the ledger,
//! and the report writer. Column mappings are carried in immutable config
//! structs so that a run is fully described by its configuration, and the
//! supported serialization formats form a closed enum validated at the
//! boundary where a format string is accepted.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format used for source dates and object-key prefixes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format used for the ledger's processing column.
pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ledger column 1: the source date that was processed.
pub const LEDGER_SOURCE_DATE_COL: &str = "source_date";

/// Ledger column 2: when the processing run happened.
pub const LEDGER_PROCESSED_AT_COL: &str = "datetime_of_processing";

/// Far-future date returned by reconciliation when nothing is missing.
/// Callers treat it as "nothing to do".
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2500, 1, 1).expect("static date")
}

/// Column mapping for the raw source table.
///
/// Field names are ours; values are the header names in the source CSVs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumns {
    pub isin: String,
    pub date: String,
    pub time: String,
    pub start_price: String,
    pub end_price: String,
    pub min_price: String,
    pub max_price: String,
    pub traded_volume: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            isin: "ISIN".into(),
            date: "Date".into(),
            time: "Time".into(),
            start_price: "StartPrice".into(),
            end_price: "EndPrice".into(),
            min_price: "MinPrice".into(),
            max_price: "MaxPrice".into(),
            traded_volume: "TradedVolume".into(),
        }
    }
}

/// Column names used in the written report artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetColumns {
    pub isin: String,
    pub date: String,
    pub opening_price: String,
    pub closing_price: String,
    pub min_price: String,
    pub max_price: String,
    pub daily_traded_volume: String,
    pub change_prev_closing: String,
}

impl Default for TargetColumns {
    fn default() -> Self {
        Self {
            isin: "isin".into(),
            date: "date".into(),
            opening_price: "opening_price_eur".into(),
            closing_price: "closing_price_eur".into(),
            min_price: "minimum_price_eur".into(),
            max_price: "maximum_price_eur".into(),
            daily_traded_volume: "daily_traded_volume".into(),
            change_prev_closing: "change_prev_closing_%".into(),
        }
    }
}

/// Supported report serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// File extension used in target object keys.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A format string that names no supported serialization format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported file format '{0}' (expected csv or parquet)")]
pub struct UnsupportedFormat(pub String);

impl FromStr for FileFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "parquet" => Ok(FileFormat::Parquet),
            other => Err(UnsupportedFormat(other.to_string())),
        }
    }
}
