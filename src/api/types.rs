//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::audit::kpi::MetricsRecord;
use crate::audit::types::{DerivedRow, TIMESTAMP_FORMAT};

/// Whether metrics were derived from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsStatus {
    /// The store held samples.
    Ready,
    /// The store was readable but empty.
    Waiting,
    /// The store could not be read.
    Degraded,
}

/// Aggregate metrics plus the display strings a dashboard needs.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub status: MetricsStatus,
    /// Waiting notice or store error, absent when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metrics: MetricsRecord,
    /// Peak load time formatted for display, or `N/A`.
    pub peak_load_time: String,
}

/// One derived row with its position in the history.
#[derive(Debug, Serialize)]
pub struct RowRecord {
    /// Zero-based sample index.
    pub index: usize,
    /// Sample timestamp in store layout.
    pub timestamp: String,
    pub power_w: f64,
    pub energy_kwh: f64,
    pub cost: f64,
    pub co2_kg: f64,
    pub co2_saved_kg: f64,
    pub credits: f64,
}

impl RowRecord {
    pub fn new(index: usize, row: &DerivedRow) -> Self {
        Self {
            index,
            timestamp: row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            power_w: row.power_w,
            energy_kwh: row.energy_kwh,
            cost: row.cost,
            co2_kg: row.co2_kg,
            co2_saved_kg: row.co2_saved_kg,
            credits: row.credits,
        }
    }
}

/// Optional renewable share override (%).
///
/// Wider than the valid range so out-of-range values reach the handler's
/// range check instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub share: Option<i64>,
}

/// Optional index range and share for the rows endpoint.
#[derive(Debug, Deserialize)]
pub struct RowsQuery {
    /// Start index (inclusive).
    pub from: Option<usize>,
    /// End index (inclusive).
    pub to: Option<usize>,
    pub share: Option<i64>,
}

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
