//! Telemetry producer that feeds the sample store with random readings.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use crate::audit::refresh::StopHandle;
use crate::audit::types::Sample;
use crate::config::SimulatorConfig;
use crate::store::{SampleStore, StoreError};

/// A random voltage/current generator.
///
/// Readings are drawn uniformly from the configured ranges and rounded to
/// two decimal places, like a meter with centi-unit resolution.
///
/// # Examples
///
/// ```
/// use green_audit::config::SimulatorConfig;
/// use green_audit::simulator::Simulator;
///
/// let cfg = SimulatorConfig { seed: Some(42), ..SimulatorConfig::default() };
/// let mut sim = Simulator::new(&cfg);
/// let sample = sim.sample_at(chrono::NaiveDateTime::default());
/// assert!((210.0..=250.0).contains(&sample.voltage_rms));
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    voltage_min: f64,
    voltage_max: f64,
    current_min: f64,
    current_max: f64,
    rng: StdRng,
}

impl Simulator {
    /// Creates a generator from validated simulator settings.
    pub fn new(cfg: &SimulatorConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            voltage_min: cfg.voltage_min,
            voltage_max: cfg.voltage_max,
            current_min: cfg.current_min,
            current_max: cfg.current_max,
            rng,
        }
    }

    /// Generates one reading stamped with `timestamp`.
    pub fn sample_at(&mut self, timestamp: NaiveDateTime) -> Sample {
        let voltage = self.rng.random_range(self.voltage_min..=self.voltage_max);
        let current = self.rng.random_range(self.current_min..=self.current_max);
        Sample::new(timestamp, round2(voltage), round2(current))
    }

    /// Truncates the store, then appends one reading per `interval`.
    ///
    /// Stops after `limit` samples when given, or when `stop` is signalled.
    ///
    /// # Returns
    ///
    /// The number of samples written.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the store cannot be reset or appended to.
    pub fn run(
        &mut self,
        store: &SampleStore,
        interval: Duration,
        limit: Option<usize>,
        stop: &StopHandle,
    ) -> Result<usize, StoreError> {
        store.reset()?;
        info!(path = %store.path().display(), "started data simulation");

        let mut written = 0;
        while !stop.is_stopped() && limit.is_none_or(|n| written < n) {
            let now = Local::now().naive_local();
            let now = now.with_nanosecond(0).unwrap_or(now);
            let sample = self.sample_at(now);
            store.append(&sample)?;
            written += 1;
            info!(
                timestamp = %sample.timestamp,
                vrms = sample.voltage_rms,
                irms = sample.current_rms,
                "logged sample"
            );

            if limit.is_some_and(|n| written >= n) || stop.wait(interval) {
                break;
            }
        }
        Ok(written)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
