//! CSV loading for bar series and precomputed signal files.
//!
//! Bar files need a `datetime` column plus `open, high, low, close, volume`;
//! extra columns are ignored and header names are whitespace-trimmed. Rows are
//! canonicalized (sorted, duplicate timestamps dropped) and then validated, so
//! the result is always engine-ready.
//!
//! Signal files have `datetime` and `signal` columns. A signal is `enter`,
//! `exit`, `hold` (any case) or a signed number.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use barlab_core::domain::{
    align_signals, AlignmentError, Bar, BarSeries, Signal, SignalSequence, ValidationError,
};

const DATETIME_COLUMN: &str = "datetime";
const SIGNAL_COLUMN: &str = "signal";
const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Naive formats tried after RFC 3339, in order.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found in CSV header")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse {column} value '{value}'")]
    BadValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("invalid bar series: {0}")]
    Validation(#[from] ValidationError),

    #[error("signals do not align with bars: {0}")]
    Alignment(#[from] AlignmentError),
}

/// Load a bar series from a CSV file.
pub fn load_csv(path: &Path) -> Result<BarSeries, LoadError> {
    let file = open(path)?;
    let series = load_csv_from_reader(file)?;
    debug!(
        path = %path.display(),
        bars = series.len(),
        "loaded bar series"
    );
    Ok(series)
}

/// Load a bar series from any CSV source.
pub fn load_csv_from_reader<R: Read>(reader: R) -> Result<BarSeries, LoadError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let datetime_idx = column_index(&headers, DATETIME_COLUMN)?;
    let mut ohlcv_idx = [0usize; 5];
    for (slot, name) in ohlcv_idx.iter_mut().zip(OHLCV_COLUMNS) {
        *slot = column_index(&headers, name)?;
    }

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let timestamp = parse_datetime(field(&record, datetime_idx), row)?;
        let mut values = [0.0f64; 5];
        for ((value, &idx), name) in values.iter_mut().zip(&ohlcv_idx).zip(OHLCV_COLUMNS) {
            *value = parse_number(field(&record, idx), row, name)?;
        }
        let [open, high, low, close, volume] = values;
        bars.push(Bar::new(timestamp, open, high, low, close, volume));
    }

    Ok(BarSeries::canonicalize(bars)?)
}

/// Load timestamped signals from CSV and align them to `bars`.
pub fn load_signals_csv(path: &Path, bars: &BarSeries) -> Result<SignalSequence, LoadError> {
    let file = open(path)?;
    load_signals_from_reader(file, bars)
}

pub fn load_signals_from_reader<R: Read>(
    reader: R,
    bars: &BarSeries,
) -> Result<SignalSequence, LoadError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    let datetime_idx = column_index(&headers, DATETIME_COLUMN)?;
    let signal_idx = column_index(&headers, SIGNAL_COLUMN)?;

    let mut timestamped = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let timestamp = parse_datetime(field(&record, datetime_idx), row)?;
        let signal = parse_signal(field(&record, signal_idx), row)?;
        timestamped.push((timestamp, signal));
    }

    Ok(align_signals(bars, &timestamped)?)
}

/// Parse a timestamp in any supported format.
///
/// RFC 3339 values with an offset are converted to UTC and the offset dropped.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ─── Helpers ────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn column_index(headers: &csv::StringRecord, name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(LoadError::MissingColumn(name))
}

fn field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn parse_datetime(value: &str, row: usize) -> Result<NaiveDateTime, LoadError> {
    parse_timestamp(value).ok_or_else(|| LoadError::BadValue {
        row,
        column: DATETIME_COLUMN,
        value: value.to_string(),
    })
}

fn parse_number(value: &str, row: usize, column: &'static str) -> Result<f64, LoadError> {
    value.parse::<f64>().map_err(|_| LoadError::BadValue {
        row,
        column,
        value: value.to_string(),
    })
}

fn parse_signal(value: &str, row: usize) -> Result<Signal, LoadError> {
    match value.to_ascii_lowercase().as_str() {
        "enter" => Ok(Signal::Enter),
        "exit" => Ok(Signal::Exit),
        "hold" => Ok(Signal::Hold),
        other => other
            .parse::<f64>()
            .map(Signal::from_strength)
            .map_err(|_| LoadError::BadValue {
                row,
                column: SIGNAL_COLUMN,
                value: value.to_string(),
            }),
    }
}
