//! CSV export for derived audit rows.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::audit::types::{DerivedRow, TIMESTAMP_FORMAT};

/// Column header for derived-row CSV export.
const HEADER: &str = "timestamp,power_w,energy_kwh,cost,co2_kg,co2_saved_kg,credits";

/// Exports derived rows to a CSV file at the given path.
///
/// Writes a header row followed by one data row per sample, in input order.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[DerivedRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes derived rows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(rows: &[DerivedRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for r in rows {
        wtr.write_record(&[
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", r.power_w),
            format!("{:.6}", r.energy_kwh),
            format!("{:.4}", r.cost),
            format!("{:.6}", r.co2_kg),
            format!("{:.6}", r.co2_saved_kg),
            format!("{:.6}", r.credits),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{Sample, Tariff, derive_rows};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(9, m, 0))
            .unwrap_or_default()
    }

    fn make_rows(n: u32) -> Vec<DerivedRow> {
        let samples: Vec<Sample> = (0..n)
            .map(|m| Sample::new(ts(m), 220.0 + f64::from(m), 1.5))
            .collect();
        derive_rows(&samples, 25.0, &Tariff::default())
    }

    #[test]
    fn header_matches_schema() {
        let mut buf = Vec::new();
        write_csv(&make_rows(1), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "timestamp,power_w,energy_kwh,cost,co2_kg,co2_saved_kg,credits"
        );
    }

    #[test]
    fn row_count_matches_sample_count() {
        let mut buf = Vec::new();
        write_csv(&make_rows(12), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 12 data rows
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn empty_rows_write_header_only() {
        let mut buf = Vec::new();
        write_csv(&[], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn first_row_values() {
        let mut buf = Vec::new();
        write_csv(&make_rows(1), &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let row = output.lines().nth(1).unwrap_or("");
        // 220 V * 1.5 A = 330 W
        assert!(row.starts_with("2024-06-01 09:00:00,330.00,0.330000,2.4420,"));
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("rows.csv");
        assert!(export_csv(&make_rows(3), &path).is_ok());

        let mut rdr = csv::ReaderBuilder::new()
            .from_path(&path)
            .expect("export should be readable");
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(7));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.expect("every row should parse");
            for i in 1..7 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
            row_count += 1;
        }
        assert_eq!(row_count, 3);
    }
}
