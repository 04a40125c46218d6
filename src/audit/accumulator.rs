//! Incremental metrics accumulation keyed by the last-seen sample offset.

use super::kpi::MetricsRecord;
use super::types::{DerivedRow, Sample, Tariff};

/// Running totals that only fold in samples appended since the previous update.
///
/// Samples are absorbed in the same order as [`MetricsRecord::derive`], so
/// the result is bit-identical to a full recompute over the same history.
/// The accumulator starts over when the history shrinks, when the last
/// absorbed sample no longer sits at its position (the store was replaced),
/// or when the renewable share changes.
#[derive(Debug, Clone)]
pub struct RunningTotals {
    tariff: Tariff,
    record: MetricsRecord,
    offset: usize,
    last: Option<Sample>,
}

impl RunningTotals {
    /// Creates an empty accumulator for the given tariff.
    pub fn new(tariff: Tariff) -> Self {
        Self {
            tariff,
            record: MetricsRecord::empty(0.0),
            offset: 0,
            last: None,
        }
    }

    /// Number of samples already folded in.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Discards all accumulated state.
    pub fn reset(&mut self) {
        self.record = MetricsRecord::empty(self.record.renewable_share);
        self.offset = 0;
        self.last = None;
    }

    /// Folds newly appended samples into the running totals.
    ///
    /// # Arguments
    ///
    /// * `samples` - Full current history; entries before the last offset are skipped
    /// * `renewable_share` - Current renewable share (%)
    ///
    /// # Returns
    ///
    /// The up-to-date aggregate record.
    pub fn update(&mut self, samples: &[Sample], renewable_share: f64) -> &MetricsRecord {
        let share_changed = self.record.renewable_share.to_bits() != renewable_share.to_bits();
        if share_changed || !self.continues(samples) {
            self.record = MetricsRecord::empty(renewable_share);
            self.offset = 0;
            self.last = None;
        }

        for sample in &samples[self.offset..] {
            self.record
                .absorb(&DerivedRow::from_sample(sample, renewable_share, &self.tariff));
        }
        self.offset = samples.len();
        self.last = samples.last().copied();
        &self.record
    }

    /// Whether `samples` extends the history absorbed so far.
    fn continues(&self, samples: &[Sample]) -> bool {
        match self.offset.checked_sub(1) {
            None => true,
            Some(i) => samples.get(i).is_some_and(|s| Some(s) == self.last.as_ref()),
        }
    }

    /// The current aggregate record.
    pub fn record(&self) -> &MetricsRecord {
        &self.record
    }
}
