//! Flat-file CSV sample store.
//!
//! The store is written by an independent producer without locking, so a
//! reader may observe a partially written last row. Such a trailing row is
//! dropped instead of failing the whole read.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use crate::audit::refresh::SampleSource;
use crate::audit::types::{Sample, TIMESTAMP_FORMAT};

/// Column header written at the top of every store.
pub const HEADER: [&str; 3] = ["timestamp", "voltage_rms", "current_rms"];

const TIMESTAMP_COLUMNS: &[&str] = &["timestamp"];
const VOLTAGE_COLUMNS: &[&str] = &["voltage_rms", "Vrms"];
const CURRENT_COLUMNS: &[&str] = &["current_rms", "Irms"];

/// Field values read as missing, alongside the empty field.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Timestamp layouts accepted on read, tried in order.
const TIMESTAMP_LAYOUTS: &[&str] = &[TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Errors raised while reading or writing the sample store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access sample store \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sample store CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sample store is missing column \"{0}\"")]
    MissingColumn(&'static str),

    #[error("malformed sample record {record}: {reason}")]
    MalformedRow { record: usize, reason: String },
}

/// Append-only sample store backed by a CSV file.
#[derive(Debug, Clone)]
pub struct SampleStore {
    path: PathBuf,
}

impl SampleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the store to a header-only file.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the file cannot be created or written.
    pub fn reset(&self) -> Result<(), StoreError> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut wtr = csv::Writer::from_writer(file);
        wtr.write_record(HEADER)?;
        wtr.flush().map_err(|e| self.io_error(e))
    }

    /// Appends one sample row, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the file cannot be opened or written.
    pub fn append(&self, sample: &Sample) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record(&[
            sample.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            sample.voltage_rms.to_string(),
            sample.current_rms.to_string(),
        ])?;
        wtr.flush().map_err(|e| self.io_error(e))
    }

    /// Reads the full sample history.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the file is missing, unreadable, lacks a
    /// required column, or contains a malformed row before the last one.
    pub fn read_all(&self) -> Result<Vec<Sample>, StoreError> {
        let bytes = fs::read(&self.path).map_err(|e| self.io_error(e))?;
        parse_samples(bytes.as_slice())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SampleSource for SampleStore {
    fn load(&mut self) -> Result<Vec<Sample>, StoreError> {
        self.read_all()
    }
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    voltage: usize,
    current: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, StoreError> {
        let find = |names: &[&'static str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| *n == h))
                .ok_or(StoreError::MissingColumn(names[0]))
        };
        Ok(Self {
            timestamp: find(TIMESTAMP_COLUMNS)?,
            voltage: find(VOLTAGE_COLUMNS)?,
            current: find(CURRENT_COLUMNS)?,
        })
    }

    /// Parses one record. `Ok(None)` means a value is missing and the row is skipped.
    fn parse(&self, record: &csv::StringRecord) -> Result<Option<Sample>, String> {
        let field = |i: usize| record.get(i).unwrap_or("");
        let (ts, v, i) = (field(self.timestamp), field(self.voltage), field(self.current));
        if [ts, v, i].into_iter().any(is_missing) {
            return Ok(None);
        }

        let timestamp = parse_timestamp(ts).ok_or_else(|| format!("invalid timestamp \"{ts}\""))?;
        let voltage_rms = v
            .parse::<f64>()
            .map_err(|e| format!("invalid voltage \"{v}\": {e}"))?;
        let current_rms = i
            .parse::<f64>()
            .map_err(|e| format!("invalid current \"{i}\": {e}"))?;
        Ok(Some(Sample::new(timestamp, voltage_rms, current_rms)))
    }
}

fn is_missing(field: &str) -> bool {
    field.is_empty() || NA_MARKERS.contains(&field)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
}

/// Parses a CSV sample table from any reader.
///
/// An empty input (not even a header) is an empty history. Rows with a
/// missing value are skipped. A row that fails to parse is dropped when it is
/// the last record and is an error anywhere else.
///
/// # Errors
///
/// Returns a `StoreError` for a missing column or an interior malformed row.
pub fn parse_samples<R: Read>(reader: R) -> Result<Vec<Sample>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let columns = Columns::locate(&headers)?;

    let records: Vec<Result<csv::StringRecord, csv::Error>> = rdr.records().collect();
    let last = records.len().saturating_sub(1);
    let mut samples = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|r| columns.parse(&r));
        match parsed {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => {}
            Err(reason) if idx == last => {
                debug!(record = idx + 1, %reason, "dropping partially written trailing row");
            }
            Err(reason) => {
                return Err(StoreError::MalformedRow {
                    record: idx + 1,
                    reason,
                });
            }
        }
    }

    Ok(samples)
}
