//! Table codecs — source CSV decoding and report serialization.
//!
//! The source reader is header-driven: the configured [`SourceColumns`]
//! mapping is resolved against the CSV header once, and blank or unparseable
//! cells become `None` (the aggregation drops such rows). The report writer
//! dispatches over the closed [`FileFormat`] enum: CSV via the `csv` crate,
//! Parquet via Polars with a date-typed date column and a nullable
//! percent-change column.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use thiserror::Error;
use xetra_core::domain::{DailyReportRow, TradeRow};
use xetra_core::schema::{FileFormat, SourceColumns, TargetColumns};

/// Errors from table encoding/decoding.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("source table is missing column '{0}'")]
    MissingColumn(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("csv buffer flush: {0}")]
    Flush(String),
}

/// Resolved header positions for the mapped source columns.
struct SourceIndices {
    isin: usize,
    date: usize,
    time: usize,
    start_price: usize,
    end_price: usize,
    min_price: usize,
    max_price: usize,
    traded_volume: usize,
}

impl SourceIndices {
    fn resolve(headers: &csv::StringRecord, cols: &SourceColumns) -> Result<Self, TableError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            isin: find(&cols.isin)?,
            date: find(&cols.date)?,
            time: find(&cols.time)?,
            start_price: find(&cols.start_price)?,
            end_price: find(&cols.end_price)?,
            min_price: find(&cols.min_price)?,
            max_price: find(&cols.max_price)?,
            traded_volume: find(&cols.traded_volume)?,
        })
    }
}

/// Decode one source CSV object into raw trade rows.
pub fn read_trades_csv(bytes: &[u8], cols: &SourceColumns) -> Result<Vec<TradeRow>, TableError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let idx = SourceIndices::resolve(reader.headers()?, cols)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(TradeRow {
            isin: cell(&record, idx.isin).map(str::to_string),
            date: parse_cell::<NaiveDate>(&record, idx.date),
            time: parse_time(&record, idx.time),
            start_price: parse_cell::<f64>(&record, idx.start_price),
            end_price: parse_cell::<f64>(&record, idx.end_price),
            min_price: parse_cell::<f64>(&record, idx.min_price),
            max_price: parse_cell::<f64>(&record, idx.max_price),
            traded_volume: parse_cell::<f64>(&record, idx.traded_volume),
        });
    }
    Ok(rows)
}

/// Serialize the daily report in the requested format.
pub fn write_report(
    rows: &[DailyReportRow],
    cols: &TargetColumns,
    format: FileFormat,
) -> Result<Vec<u8>, TableError> {
    match format {
        FileFormat::Csv => write_report_csv(rows, cols),
        FileFormat::Parquet => write_report_parquet(rows, cols),
    }
}

fn write_report_csv(rows: &[DailyReportRow], cols: &TargetColumns) -> Result<Vec<u8>, TableError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        cols.isin.as_str(),
        cols.date.as_str(),
        cols.opening_price.as_str(),
        cols.closing_price.as_str(),
        cols.min_price.as_str(),
        cols.max_price.as_str(),
        cols.daily_traded_volume.as_str(),
        cols.change_prev_closing.as_str(),
    ])?;

    for r in rows {
        wtr.write_record([
            r.isin.clone(),
            r.date.to_string(),
            format!("{:.2}", r.opening_price),
            format!("{:.2}", r.closing_price),
            format!("{:.2}", r.min_price),
            format!("{:.2}", r.max_price),
            format!("{:.2}", r.daily_traded_volume),
            r.change_prev_closing
                .map(|c| format!("{c:.2}"))
                .unwrap_or_default(),
        ])?;
    }

    wtr.into_inner().map_err(|e| TableError::Flush(e.to_string()))
}

fn write_report_parquet(
    rows: &[DailyReportRow],
    cols: &TargetColumns,
) -> Result<Vec<u8>, TableError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("static date");

    let isins: Vec<String> = rows.iter().map(|r| r.isin.clone()).collect();
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let openings: Vec<f64> = rows.iter().map(|r| r.opening_price).collect();
    let closings: Vec<f64> = rows.iter().map(|r| r.closing_price).collect();
    let mins: Vec<f64> = rows.iter().map(|r| r.min_price).collect();
    let maxes: Vec<f64> = rows.iter().map(|r| r.max_price).collect();
    let volumes: Vec<f64> = rows.iter().map(|r| r.daily_traded_volume).collect();
    let changes: Vec<Option<f64>> = rows.iter().map(|r| r.change_prev_closing).collect();

    let df = DataFrame::new(vec![
        Column::new(cols.isin.as_str().into(), isins),
        Column::new(cols.date.as_str().into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| TableError::Parquet(format!("date cast: {e}")))?,
        Column::new(cols.opening_price.as_str().into(), openings),
        Column::new(cols.closing_price.as_str().into(), closings),
        Column::new(cols.min_price.as_str().into(), mins),
        Column::new(cols.max_price.as_str().into(), maxes),
        Column::new(cols.daily_traded_volume.as_str().into(), volumes),
        Column::new(cols.change_prev_closing.as_str().into(), changes),
    ])
    .map_err(|e| TableError::Parquet(format!("dataframe creation: {e}")))?;

    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf)
        .finish(&mut df.clone())
        .map_err(|e| TableError::Parquet(format!("write parquet: {e}")))?;
    Ok(buf)
}

fn cell<'r>(record: &'r csv::StringRecord, idx: usize) -> Option<&'r str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_cell<T: FromStr>(record: &csv::StringRecord, idx: usize) -> Option<T> {
    cell(record, idx).and_then(|s| s.parse().ok())
}

/// Source files carry times as either `HH:MM` or `HH:MM:SS`.
fn parse_time(record: &csv::StringRecord, idx: usize) -> Option<NaiveTime> {
    let s = cell(record, idx)?;
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
