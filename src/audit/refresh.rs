//! Fixed-cadence refresh loop over a growing sample store.
//!
//! Each cycle reloads the whole store, derives metrics over the full history,
//! and hands the outcome to the caller. The per-cycle step ([`RefreshLoop::tick`])
//! is independent of scheduling so it can be driven by a timer, a UI event
//! loop, or a test.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::accumulator::RunningTotals;
use super::kpi::MetricsRecord;
use super::types::{DerivedRow, Sample, Tariff, derive_rows};
use crate::store::StoreError;

/// Shown while the store holds no samples.
pub const WAITING_MESSAGE: &str = "Waiting for data... Please keep the data simulator running.";

/// Longest uninterrupted sleep while waiting between cycles.
const STOP_POLL: Duration = Duration::from_millis(50);

/// Anything that can produce the full current sample history.
pub trait SampleSource {
    /// Reads every sample currently available.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` when the backing data is unreadable or malformed.
    fn load(&mut self) -> Result<Vec<Sample>, StoreError>;
}

impl<F> SampleSource for F
where
    F: FnMut() -> Result<Vec<Sample>, StoreError>,
{
    fn load(&mut self) -> Result<Vec<Sample>, StoreError> {
        self()
    }
}

/// How metrics are recomputed on each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshStrategy {
    /// Recompute from scratch over the whole history.
    #[default]
    Full,
    /// Fold in only samples appended since the previous cycle.
    Incremental,
}

impl RefreshStrategy {
    /// Accepted configuration names.
    pub const NAMES: &[&str] = &["full", "incremental"];

    /// Parses a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(Self::Full),
            "incremental" => Some(Self::Incremental),
            _ => None,
        }
    }
}

/// Samples and metrics captured by one successful cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Full sample history as read this cycle.
    pub samples: Vec<Sample>,
    /// Aggregates over `samples`.
    pub metrics: MetricsRecord,
    tariff: Tariff,
}

impl Snapshot {
    /// Per-sample derived rows, for charts and row exports.
    pub fn rows(&self) -> Vec<DerivedRow> {
        derive_rows(&self.samples, self.metrics.renewable_share, &self.tariff)
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug)]
pub enum Cycle {
    /// The store held samples; metrics were derived.
    Ready(Snapshot),
    /// The store was readable but empty.
    Waiting,
    /// The store could not be read; the cycle behaved as if it were empty.
    Degraded(StoreError),
}

impl Cycle {
    /// Metrics of a ready cycle.
    pub fn metrics(&self) -> Option<&MetricsRecord> {
        match self {
            Self::Ready(snapshot) => Some(&snapshot.metrics),
            Self::Waiting | Self::Degraded(_) => None,
        }
    }

    /// Returns `true` when no metrics are available this cycle.
    pub fn is_waiting(&self) -> bool {
        !matches!(self, Self::Ready(_))
    }
}

/// Renewable share (%) adjustable from another thread between cycles.
///
/// Values are whole percentages clamped to `0..=100`.
#[derive(Debug, Clone, Default)]
pub struct ShareControl(Arc<AtomicU8>);

impl ShareControl {
    pub const MAX: u8 = 100;

    /// Creates a control holding `percent`, clamped to 100.
    pub fn new(percent: u8) -> Self {
        Self(Arc::new(AtomicU8::new(percent.min(Self::MAX))))
    }

    /// Current share (%).
    pub fn percent(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    /// Sets the share, clamped to 100.
    pub fn set(&self, percent: u8) {
        self.0.store(percent.min(Self::MAX), Ordering::Relaxed);
    }

    /// Moves the share by `delta` points, saturating at 0 and 100.
    pub fn adjust(&self, delta: i16) -> u8 {
        let next = (i16::from(self.percent()) + delta).clamp(0, i16::from(Self::MAX));
        // clamped into 0..=100 above
        let next = u8::try_from(next).unwrap_or(Self::MAX);
        self.set(next);
        next
    }

    /// Current share as the engine's floating-point percentage.
    pub fn as_f64(&self) -> f64 {
        f64::from(self.percent())
    }
}

/// Cooperative stop flag shared between a loop and its controller.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the owning loop to stop at its next check.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleeps for `duration`, waking early if a stop is requested.
    ///
    /// # Returns
    ///
    /// `true` if the wait ended because of a stop request.
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            thread::sleep(remaining.min(STOP_POLL));
        }
    }
}

/// Drives metric derivation against a sample source on a fixed cadence.
pub struct RefreshLoop<S: SampleSource> {
    source: S,
    tariff: Tariff,
    interval: Duration,
    strategy: RefreshStrategy,
    running: RunningTotals,
    cycles: usize,
}

impl<S: SampleSource> RefreshLoop<S> {
    /// Creates a loop using full recomputation.
    ///
    /// # Arguments
    ///
    /// * `source` - Where each cycle reads its samples from
    /// * `tariff` - Constants passed to the metrics engine
    /// * `interval` - Pause between cycles
    pub fn new(source: S, tariff: Tariff, interval: Duration) -> Self {
        Self {
            source,
            tariff,
            interval,
            strategy: RefreshStrategy::Full,
            running: RunningTotals::new(tariff),
            cycles: 0,
        }
    }

    /// Selects how metrics are recomputed.
    pub fn with_strategy(mut self, strategy: RefreshStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    /// Number of cycles executed so far.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Runs a single cycle: reload the source and derive metrics.
    ///
    /// Never fails. An unreadable source yields [`Cycle::Degraded`] and is
    /// otherwise treated as an empty sample set.
    pub fn tick(&mut self, renewable_share: f64) -> Cycle {
        self.cycles += 1;

        let samples = match self.source.load() {
            Ok(samples) => samples,
            Err(e) => {
                warn!(cycle = self.cycles, error = %e, "sample store unavailable, treating as empty");
                self.running.reset();
                return Cycle::Degraded(e);
            }
        };

        if samples.is_empty() {
            debug!(cycle = self.cycles, "no samples yet");
            self.running.reset();
            return Cycle::Waiting;
        }

        let metrics = match self.strategy {
            RefreshStrategy::Full => MetricsRecord::derive(&samples, renewable_share, &self.tariff),
            RefreshStrategy::Incremental => self.running.update(&samples, renewable_share).clone(),
        };
        debug!(
            cycle = self.cycles,
            samples = metrics.sample_count,
            energy_kwh = metrics.total_energy_kwh,
            "metrics refreshed"
        );

        Cycle::Ready(Snapshot {
            samples,
            metrics,
            tariff: self.tariff,
        })
    }

    /// Runs cycles until stopped or `limit` cycles have completed.
    ///
    /// The share is re-read from `share` at the start of every cycle and each
    /// outcome is passed to `on_cycle`.
    ///
    /// # Returns
    ///
    /// The number of cycles executed by this call.
    pub fn run(
        &mut self,
        share: &ShareControl,
        stop: &StopHandle,
        limit: Option<usize>,
        mut on_cycle: impl FnMut(&Cycle),
    ) -> usize {
        info!(interval_ms = self.interval.as_millis() as u64, "refresh loop started");
        let mut executed = 0;
        while !stop.is_stopped() {
            let cycle = self.tick(share.as_f64());
            on_cycle(&cycle);
            executed += 1;

            if limit.is_some_and(|n| executed >= n) {
                break;
            }
            if stop.wait(self.interval) {
                break;
            }
        }
        info!(cycles = executed, "refresh loop stopped");
        executed
    }
}
