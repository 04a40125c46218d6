//! Core audit types: telemetry samples, tariff constants, and per-sample derived rows.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp layout written by the simulator and expected in the sample store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One telemetry reading.
///
/// Values are taken as-is: negative or non-finite readings are not rejected
/// and propagate through every derived quantity.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use green_audit::audit::types::Sample;
///
/// let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
///     .and_then(|d| d.and_hms_opt(12, 0, 0))
///     .unwrap_or_default();
/// let sample = Sample::new(ts, 230.0, 2.0);
/// assert_eq!(sample.power_w(), 460.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Wall-clock time of the reading.
    pub timestamp: NaiveDateTime,
    /// RMS voltage (V).
    pub voltage_rms: f64,
    /// RMS current (A).
    pub current_rms: f64,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(timestamp: NaiveDateTime, voltage_rms: f64, current_rms: f64) -> Self {
        Self {
            timestamp,
            voltage_rms,
            current_rms,
        }
    }

    /// Instantaneous power (W), `voltage_rms * current_rms`.
    pub fn power_w(&self) -> f64 {
        self.voltage_rms * self.current_rms
    }
}

/// Pricing and emission constants applied to every unit of energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tariff {
    /// Price per kWh (INR).
    pub price_per_unit: f64,
    /// Grid emission factor (kg CO2 per kWh).
    pub emission_factor: f64,
    /// Carbon credits earned per kg of CO2 avoided.
    pub credit_rate: f64,
}

impl Tariff {
    pub const DEFAULT_PRICE_PER_UNIT: f64 = 7.4;
    pub const DEFAULT_EMISSION_FACTOR: f64 = 0.82;
    pub const DEFAULT_CREDIT_RATE: f64 = 0.15;

    /// Creates a tariff from explicit constants.
    pub fn new(price_per_unit: f64, emission_factor: f64, credit_rate: f64) -> Self {
        Self {
            price_per_unit,
            emission_factor,
            credit_rate,
        }
    }

    /// Prices an amount of energy and attributes a share of it to a renewable source.
    ///
    /// # Arguments
    ///
    /// * `energy_kwh` - Energy consumed (kWh)
    /// * `renewable_share` - Percentage of that energy attributed to a green source (0-100)
    pub fn attribute(&self, energy_kwh: f64, renewable_share: f64) -> Attribution {
        let renewable_kwh = energy_kwh * (renewable_share / 100.0);
        let co2_saved_kg = renewable_kwh * self.emission_factor;
        Attribution {
            cost: energy_kwh * self.price_per_unit,
            co2_kg: energy_kwh * self.emission_factor,
            co2_saved_kg,
            credits: co2_saved_kg * self.credit_rate,
        }
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_PRICE_PER_UNIT,
            Self::DEFAULT_EMISSION_FACTOR,
            Self::DEFAULT_CREDIT_RATE,
        )
    }
}

/// Cost and carbon accounting for one amount of energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribution {
    /// Energy cost (INR).
    pub cost: f64,
    /// Emissions at the grid factor (kg CO2).
    pub co2_kg: f64,
    /// Emissions avoided by the renewable share (kg CO2).
    pub co2_saved_kg: f64,
    /// Carbon credits for the avoided emissions.
    pub credits: f64,
}

/// Quantities derived from a single sample. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRow {
    pub timestamp: NaiveDateTime,
    pub power_w: f64,
    pub energy_kwh: f64,
    pub cost: f64,
    pub co2_kg: f64,
    pub co2_saved_kg: f64,
    pub credits: f64,
}

impl DerivedRow {
    /// Derives power, energy, cost, and carbon figures for one sample.
    pub fn from_sample(sample: &Sample, renewable_share: f64, tariff: &Tariff) -> Self {
        let power_w = sample.power_w();
        let energy_kwh = power_w / 1000.0;
        let a = tariff.attribute(energy_kwh, renewable_share);
        Self {
            timestamp: sample.timestamp,
            power_w,
            energy_kwh,
            cost: a.cost,
            co2_kg: a.co2_kg,
            co2_saved_kg: a.co2_saved_kg,
            credits: a.credits,
        }
    }
}

/// Derives one row per sample, preserving input order.
pub fn derive_rows(samples: &[Sample], renewable_share: f64, tariff: &Tariff) -> Vec<DerivedRow> {
    samples
        .iter()
        .map(|s| DerivedRow::from_sample(s, renewable_share, tariff))
        .collect()
}
