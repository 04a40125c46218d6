//! Aggregate audit metrics derived from a complete sample set.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::types::{DerivedRow, Sample, Tariff};

/// Display layout for peak-load timestamps, e.g. `01-03-2024 02:05 PM`.
pub const PEAK_TIME_FORMAT: &str = "%d-%m-%Y %I:%M %p";

/// Placeholder shown wherever the peak load is unavailable.
pub const UNAVAILABLE: &str = "N/A";

pub const LABEL_ENERGY: &str = "Total Energy (kWh)";
pub const LABEL_COST: &str = "Total Cost (INR)";
pub const LABEL_CO2: &str = "Total CO2 Emission (kg)";
pub const LABEL_CO2_SAVED: &str = "Cumulative CO2 Saved (kg)";
pub const LABEL_CREDITS: &str = "Estimated Carbon Credits";
pub const LABEL_PEAK: &str = "Peak Load Time";

/// The highest-power sample of a set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakLoad {
    /// Timestamp of the peak sample.
    pub timestamp: NaiveDateTime,
    /// Power at the peak (W).
    pub power_w: f64,
}

impl PeakLoad {
    /// Formats the peak timestamp for dashboards and reports.
    pub fn display_time(&self) -> String {
        self.timestamp.format(PEAK_TIME_FORMAT).to_string()
    }
}

/// A single reportable metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Rendered with two decimal places.
    Number(f64),
    /// Rendered verbatim.
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Aggregate metrics over the full sample history.
///
/// Totals are plain sums over all samples. Recomputing from the same inputs
/// always yields an identical record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    /// Total energy consumed (kWh).
    pub total_energy_kwh: f64,
    /// Total cost (INR).
    pub total_cost: f64,
    /// Total emissions (kg CO2).
    pub total_co2_kg: f64,
    /// Emissions avoided by the renewable share (kg CO2).
    pub total_co2_saved_kg: f64,
    /// Carbon credits earned for avoided emissions.
    pub total_carbon_credits: f64,
    /// Highest-power sample, `None` when no samples were seen.
    pub peak_load: Option<PeakLoad>,
    /// Number of samples aggregated.
    pub sample_count: usize,
    /// Renewable share (%) the record was derived with.
    pub renewable_share: f64,
}

impl MetricsRecord {
    /// Returns a zeroed record with an unavailable peak.
    pub fn empty(renewable_share: f64) -> Self {
        Self {
            total_energy_kwh: 0.0,
            total_cost: 0.0,
            total_co2_kg: 0.0,
            total_co2_saved_kg: 0.0,
            total_carbon_credits: 0.0,
            peak_load: None,
            sample_count: 0,
            renewable_share,
        }
    }

    /// Derives aggregate metrics from a complete sample set.
    ///
    /// # Arguments
    ///
    /// * `samples` - Full sample history, in store order (may be empty)
    /// * `renewable_share` - Percentage of consumption attributed to a green source
    /// * `tariff` - Price, emission factor, and credit rate
    ///
    /// # Returns
    ///
    /// A `MetricsRecord` with summed totals and the first maximum-power sample
    /// as the peak load.
    pub fn derive(samples: &[Sample], renewable_share: f64, tariff: &Tariff) -> Self {
        let mut record = Self::empty(renewable_share);
        for sample in samples {
            record.absorb(&DerivedRow::from_sample(sample, renewable_share, tariff));
        }
        record
    }

    /// Folds one derived row into the running totals.
    ///
    /// A row replaces the current peak only when strictly greater, so ties
    /// keep the earliest row.
    pub(crate) fn absorb(&mut self, row: &DerivedRow) {
        self.total_energy_kwh += row.energy_kwh;
        self.total_cost += row.cost;
        self.total_co2_kg += row.co2_kg;
        self.total_co2_saved_kg += row.co2_saved_kg;
        self.total_carbon_credits += row.credits;

        let replaces = self
            .peak_load
            .is_none_or(|peak| row.power_w > peak.power_w);
        if replaces {
            self.peak_load = Some(PeakLoad {
                timestamp: row.timestamp,
                power_w: row.power_w,
            });
        }
        self.sample_count += 1;
    }

    /// Peak load time for display, or `N/A` when unavailable.
    pub fn peak_time_display(&self) -> String {
        self.peak_load
            .map_or_else(|| UNAVAILABLE.to_string(), |p| p.display_time())
    }

    /// Labelled metric values in report order.
    pub fn entries(&self) -> [(&'static str, MetricValue); 6] {
        [
            (LABEL_ENERGY, MetricValue::Number(self.total_energy_kwh)),
            (LABEL_COST, MetricValue::Number(self.total_cost)),
            (LABEL_CO2, MetricValue::Number(self.total_co2_kg)),
            (LABEL_CO2_SAVED, MetricValue::Number(self.total_co2_saved_kg)),
            (LABEL_CREDITS, MetricValue::Number(self.total_carbon_credits)),
            (LABEL_PEAK, MetricValue::Text(self.peak_time_display())),
        ]
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Green Audit ---")?;
        writeln!(f, "Samples:               {}", self.sample_count)?;
        writeln!(f, "Renewable share:       {:.0}%", self.renewable_share)?;
        writeln!(f, "Total energy:          {:.2} kWh", self.total_energy_kwh)?;
        writeln!(f, "Total cost:            {:.2} INR", self.total_cost)?;
        writeln!(f, "Total CO2 emission:    {:.2} kg", self.total_co2_kg)?;
        writeln!(f, "CO2 saved:             {:.2} kg", self.total_co2_saved_kg)?;
        writeln!(f, "Carbon credits:        {:.2}", self.total_carbon_credits)?;
        match self.peak_load {
            Some(p) => write!(f, "Peak load:             {:.1} W at {}", p.power_w, p.display_time()),
            None => write!(f, "Peak load:             {UNAVAILABLE}"),
        }
    }
}
