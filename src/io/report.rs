//! Plain-text Green Audit report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::audit::kpi::MetricsRecord;
use crate::config::ReportConfig;

/// Separator line between report sections.
const DIVIDER: &str = "--------------------------------------------------";

/// Renders a metrics record as a report document.
///
/// Layout: title, divider, one `Label: value` line per metric in fixed order,
/// divider, footer. Numbers use two decimals; an unavailable peak is `N/A`.
pub fn render_report(metrics: &MetricsRecord, cfg: &ReportConfig) -> String {
    let width = DIVIDER.len();
    let mut out = String::new();
    out.push_str(&format!("{:^width$}\n", cfg.title));
    out.push_str(DIVIDER);
    out.push('\n');
    for (label, value) in metrics.entries() {
        out.push_str(&format!("{label}: {value}\n"));
    }
    out.push_str(DIVIDER);
    out.push('\n');
    out.push_str(&format!("{:^width$}\n", cfg.footer));
    out
}

/// Writes the rendered report to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_report(metrics: &MetricsRecord, cfg: &ReportConfig, mut writer: impl Write) -> io::Result<()> {
    writer.write_all(render_report(metrics, cfg).as_bytes())?;
    writer.flush()
}

/// Writes the rendered report to a file, replacing any existing content.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_report(metrics: &MetricsRecord, cfg: &ReportConfig, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_report(metrics, cfg, BufWriter::new(file))
}
