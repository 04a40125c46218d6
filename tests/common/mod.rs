//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use green_audit::audit::types::Sample;
use green_audit::store::SampleStore;
use tempfile::TempDir;

/// Absolute tolerance for float comparisons.
pub const TOLERANCE: f64 = 1e-9;

/// Returns `true` when `a` and `b` agree within [`TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

/// Timestamp on 2024-03-01 at the given time of day.
pub fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .unwrap_or_default()
}

/// The two-sample history used across metric tests (220 V x 2 A, 230 V x 1 A).
pub fn two_samples() -> Vec<Sample> {
    vec![
        Sample::new(ts(9, 0, 0), 220.0, 2.0),
        Sample::new(ts(9, 0, 5), 230.0, 1.0),
    ]
}

/// A header-only store inside a fresh temp directory.
///
/// Keep the `TempDir` alive for as long as the store is used.
pub fn empty_store() -> (TempDir, SampleStore) {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = SampleStore::new(dir.path().join("energy_data.csv"));
    store.reset().expect("store should reset");
    (dir, store)
}

/// A store pre-filled with `samples`.
pub fn store_with(samples: &[Sample]) -> (TempDir, SampleStore) {
    let (dir, store) = empty_store();
    for s in samples {
        store.append(s).expect("sample should be appended");
    }
    (dir, store)
}
