//! Dashboard state driven by the refresh loop.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use crate::audit::kpi::MetricsRecord;
use crate::audit::refresh::{Cycle, RefreshLoop, ShareControl};
use crate::audit::types::DerivedRow;
use crate::config::{AuditConfig, ReportConfig};
use crate::io::report::export_report;
use crate::store::{SampleStore, StoreError};

/// Maximum number of rows kept for the rolling charts.
const MAX_HISTORY: usize = 200;

/// TUI application state.
pub struct App {
    refresh: RefreshLoop<SampleStore>,
    share: ShareControl,
    report: ReportConfig,
    report_path: PathBuf,
    /// Outcome of the most recent refresh cycle.
    latest: Option<Cycle>,
    /// Tail of the derived rows for the charts.
    pub rows: VecDeque<DerivedRow>,
    /// Whether refreshing is paused.
    pub paused: bool,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last refresh cycle ran.
    pub last_tick: Instant,
    /// One-line feedback from the last user action.
    pub status: Option<String>,
}

impl App {
    /// Creates an app reading the configured store. No cycle has run yet.
    pub fn new(cfg: &AuditConfig) -> Self {
        let store = SampleStore::new(&cfg.dashboard.store_path);
        let refresh = RefreshLoop::new(store, cfg.tariff(), cfg.refresh_interval())
            .with_strategy(cfg.strategy());
        Self {
            refresh,
            share: ShareControl::new(cfg.dashboard.renewable_share),
            report: cfg.report.clone(),
            report_path: cfg.dashboard.report_path.clone(),
            latest: None,
            rows: VecDeque::with_capacity(MAX_HISTORY),
            paused: false,
            quit: false,
            last_tick: Instant::now(),
            status: None,
        }
    }

    /// Runs one refresh cycle at the current share.
    pub fn tick(&mut self) {
        let cycle = self.refresh.tick(self.share.as_f64());
        self.rows.clear();
        if let Cycle::Ready(snapshot) = &cycle {
            let rows = snapshot.rows();
            let skip = rows.len().saturating_sub(MAX_HISTORY);
            self.rows.extend(rows.into_iter().skip(skip));
        }
        self.latest = Some(cycle);
        self.last_tick = Instant::now();
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Moves the renewable share and refreshes so the view follows at once.
    pub fn adjust_share(&mut self, delta: i16) {
        let percent = self.share.adjust(delta);
        self.status = Some(format!("Renewable share set to {percent}%"));
        self.tick();
    }

    /// Current renewable share (%).
    pub fn share_percent(&self) -> u8 {
        self.share.percent()
    }

    /// Pause between refresh cycles.
    pub fn interval(&self) -> Duration {
        self.refresh.interval()
    }

    /// Number of cycles executed so far.
    pub fn cycles(&self) -> usize {
        self.refresh.cycles()
    }

    /// Metrics of the latest cycle, if it found data.
    pub fn metrics(&self) -> Option<&MetricsRecord> {
        self.latest.as_ref().and_then(Cycle::metrics)
    }

    /// Store error from the latest cycle, if it was degraded.
    pub fn store_error(&self) -> Option<&StoreError> {
        match &self.latest {
            Some(Cycle::Degraded(e)) => Some(e),
            _ => None,
        }
    }

    /// Writes the text report for the current metrics.
    ///
    /// With no data the report shows zeros and `N/A`. The outcome is shown
    /// on the status line.
    pub fn export_report(&mut self) {
        let empty;
        let metrics = match self.metrics() {
            Some(m) => m,
            None => {
                empty = MetricsRecord::empty(self.share.as_f64());
                &empty
            }
        };
        let status = match export_report(metrics, &self.report, &self.report_path) {
            Ok(()) => {
                info!(path = %self.report_path.display(), "report exported");
                format!("Report written to {}", self.report_path.display())
            }
            Err(e) => format!("Report export failed: {e}"),
        };
        self.status = Some(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::Sample;
    use chrono::NaiveDate;

    fn config(dir: &tempfile::TempDir) -> AuditConfig {
        let mut cfg = AuditConfig::default();
        cfg.dashboard.store_path = dir.path().join("energy.csv");
        cfg.dashboard.report_path = dir.path().join("report.txt");
        cfg
    }

    fn append(store: &SampleStore, n: u32) {
        for s in 0..n {
            let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(10, s / 60, s % 60))
                .unwrap_or_default();
            store
                .append(&Sample::new(ts, 230.0, 2.0))
                .expect("sample should be appended");
        }
    }

    #[test]
    fn app_waits_then_shows_metrics() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let cfg = config(&dir);
        let store = SampleStore::new(&cfg.dashboard.store_path);
        store.reset().expect("store should reset");

        let mut app = App::new(&cfg);
        app.tick();
        assert!(app.metrics().is_none());
        assert!(app.store_error().is_none());

        append(&store, 3);
        app.tick();
        assert_eq!(app.metrics().map(|m| m.sample_count), Some(3));
        assert_eq!(app.rows.len(), 3);
        assert_eq!(app.cycles(), 2);
    }

    #[test]
    fn missing_store_is_degraded() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut app = App::new(&config(&dir));
        app.tick();
        assert!(app.store_error().is_some());
        assert!(app.metrics().is_none());
    }

    #[test]
    fn history_caps_at_max() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let cfg = config(&dir);
        append(&SampleStore::new(&cfg.dashboard.store_path), 250);

        let mut app = App::new(&cfg);
        app.tick();
        assert_eq!(app.rows.len(), MAX_HISTORY);
        assert_eq!(app.metrics().map(|m| m.sample_count), Some(250));
    }

    #[test]
    fn share_change_recomputes() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let cfg = config(&dir);
        append(&SampleStore::new(&cfg.dashboard.store_path), 1);

        let mut app = App::new(&cfg);
        app.tick();
        let before = app.metrics().map(|m| m.total_co2_saved_kg);
        app.adjust_share(75);
        assert_eq!(app.share_percent(), 100);
        let after = app.metrics().map(|m| m.total_co2_saved_kg);
        assert!(after > before);
        assert_eq!(app.status.as_deref(), Some("Renewable share set to 100%"));
    }

    #[test]
    fn export_without_data_writes_zero_report() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let cfg = config(&dir);
        let mut app = App::new(&cfg);
        app.export_report();

        let text = std::fs::read_to_string(&cfg.dashboard.report_path).unwrap_or_default();
        assert!(text.contains("Peak Load Time: N/A"));
        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("Report written")));
    }

    #[test]
    fn toggle_pause() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut app = App::new(&config(&dir));
        assert!(!app.paused);
        app.toggle_pause();
        assert!(app.paused);
        app.toggle_pause();
        assert!(!app.paused);
    }
}
