//! TOML-based audit configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::audit::refresh::RefreshStrategy;
use crate::audit::types::Tariff;

/// Top-level configuration parsed from TOML.
///
/// Every section is optional and falls back to the built-in defaults. Load
/// from TOML with [`AuditConfig::from_toml_file`] or use
/// [`AuditConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Pricing and emission constants.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Sample store location and refresh behaviour.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Telemetry producer parameters.
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Report header and footer text.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Pricing and emission constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Price per kWh (INR).
    pub price_per_unit: f64,
    /// Grid emission factor (kg CO2 per kWh).
    pub emission_factor: f64,
    /// Credits per kg of CO2 avoided.
    pub credit_rate: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            price_per_unit: Tariff::DEFAULT_PRICE_PER_UNIT,
            emission_factor: Tariff::DEFAULT_EMISSION_FACTOR,
            credit_rate: Tariff::DEFAULT_CREDIT_RATE,
        }
    }
}

/// Sample store location and refresh behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Path of the CSV sample store.
    pub store_path: PathBuf,
    /// Initial renewable share (%), 0-100.
    pub renewable_share: u8,
    /// Pause between refresh cycles (ms).
    pub refresh_interval_ms: u64,
    /// Recompute strategy: `"full"` or `"incremental"`.
    pub strategy: String,
    /// Where the dashboard writes exported reports.
    pub report_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("energy_data.csv"),
            renewable_share: 25,
            refresh_interval_ms: 1000,
            strategy: "full".to_string(),
            report_path: PathBuf::from("green_audit_report.txt"),
        }
    }
}

/// Telemetry producer parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Pause between generated samples (ms).
    pub interval_ms: u64,
    /// Random seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Lower bound of generated RMS voltage (V).
    pub voltage_min: f64,
    /// Upper bound of generated RMS voltage (V).
    pub voltage_max: f64,
    /// Lower bound of generated RMS current (A).
    pub current_min: f64,
    /// Upper bound of generated RMS current (A).
    pub current_max: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            seed: None,
            voltage_min: 210.0,
            voltage_max: 250.0,
            current_min: 0.5,
            current_max: 8.0,
        }
    }
}

/// Report header and footer text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub title: String,
    pub footer: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Green Audit Report".to_string(),
            footer: "@ElectriCheck Innovators".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"dashboard.renewable_share"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AuditConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Tariff handed to the metrics engine.
    pub fn tariff(&self) -> Tariff {
        let t = &self.tariff;
        Tariff::new(t.price_per_unit, t.emission_factor, t.credit_rate)
    }

    /// Refresh strategy, falling back to full recomputation for unknown names.
    pub fn strategy(&self) -> RefreshStrategy {
        RefreshStrategy::from_name(&self.dashboard.strategy).unwrap_or_default()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard.refresh_interval_ms)
    }

    pub fn simulator_interval(&self) -> Duration {
        Duration::from_millis(self.simulator.interval_ms)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let t = &self.tariff;
        for (field, value) in [
            ("tariff.price_per_unit", t.price_per_unit),
            ("tariff.emission_factor", t.emission_factor),
            ("tariff.credit_rate", t.credit_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be a finite number >= 0".into(),
                });
            }
        }

        let d = &self.dashboard;
        if d.renewable_share > 100 {
            errors.push(ConfigError {
                field: "dashboard.renewable_share".into(),
                message: format!("must be in [0, 100], got {}", d.renewable_share),
            });
        }
        if d.refresh_interval_ms == 0 {
            errors.push(ConfigError {
                field: "dashboard.refresh_interval_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if RefreshStrategy::from_name(&d.strategy).is_none() {
            errors.push(ConfigError {
                field: "dashboard.strategy".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    RefreshStrategy::NAMES.join(", "),
                    d.strategy
                ),
            });
        }
        if d.store_path.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "dashboard.store_path".into(),
                message: "must not be empty".into(),
            });
        }

        let s = &self.simulator;
        if s.interval_ms == 0 {
            errors.push(ConfigError {
                field: "simulator.interval_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if !(s.voltage_min.is_finite() && s.voltage_max.is_finite()) || s.voltage_min >= s.voltage_max
        {
            errors.push(ConfigError {
                field: "simulator.voltage_min".into(),
                message: "must be finite and < simulator.voltage_max".into(),
            });
        }
        if !(s.current_min.is_finite() && s.current_max.is_finite()) || s.current_min >= s.current_max
        {
            errors.push(ConfigError {
                field: "simulator.current_min".into(),
                message: "must be finite and < simulator.current_max".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let cfg = AuditConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn default_tariff_matches_constants() {
        assert_eq!(AuditConfig::default().tariff(), Tariff::default());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[tariff]
price_per_unit = 8.0
emission_factor = 0.7
credit_rate = 0.2

[dashboard]
store_path = "/var/lib/green-audit/energy.csv"
renewable_share = 40
refresh_interval_ms = 500
strategy = "incremental"
report_path = "out/report.txt"

[simulator]
interval_ms = 250
seed = 7
voltage_min = 200.0
voltage_max = 240.0
current_min = 1.0
current_max = 4.0

[report]
title = "Site Audit"
footer = "Facilities team"
"#;
        let cfg = AuditConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.dashboard.renewable_share), Some(40));
        assert_eq!(cfg.as_ref().map(AuditConfig::strategy), Some(RefreshStrategy::Incremental));
        assert_eq!(cfg.as_ref().and_then(|c| c.simulator.seed), Some(7));
        assert_eq!(cfg.as_ref().map(|c| c.tariff().price_per_unit), Some(8.0));
        assert_eq!(cfg.as_ref().map(|c| &*c.report.title), Some("Site Audit"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[dashboard]
renewable_share = 60
"#;
        let cfg = AuditConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.dashboard.renewable_share), Some(60));
        assert_eq!(cfg.as_ref().map(|c| c.dashboard.refresh_interval_ms), Some(1000));
        assert_eq!(cfg.as_ref().map(|c| c.simulator.interval_ms), Some(5000));
        assert_eq!(cfg.as_ref().map(|c| c.tariff.credit_rate), Some(0.15));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[tariff]
price_per_unit = 7.4
discount = 0.1
"#;
        assert!(AuditConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_share_above_hundred() {
        let mut cfg = AuditConfig::default();
        cfg.dashboard.renewable_share = 101;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "dashboard.renewable_share"));
    }

    #[test]
    fn validation_catches_zero_interval() {
        let mut cfg = AuditConfig::default();
        cfg.dashboard.refresh_interval_ms = 0;
        cfg.simulator.interval_ms = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "dashboard.refresh_interval_ms"));
        assert!(errors.iter().any(|e| e.field == "simulator.interval_ms"));
    }

    #[test]
    fn validation_catches_bad_strategy() {
        let mut cfg = AuditConfig::default();
        cfg.dashboard.strategy = "streaming".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "dashboard.strategy"));
    }

    #[test]
    fn validation_catches_negative_tariff() {
        let mut cfg = AuditConfig::default();
        cfg.tariff.emission_factor = -0.1;
        cfg.tariff.price_per_unit = f64::NAN;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tariff.emission_factor"));
        assert!(errors.iter().any(|e| e.field == "tariff.price_per_unit"));
    }

    #[test]
    fn validation_catches_inverted_simulator_ranges() {
        let mut cfg = AuditConfig::default();
        cfg.simulator.voltage_min = 260.0;
        cfg.simulator.current_max = 0.1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulator.voltage_min"));
        assert!(errors.iter().any(|e| e.field == "simulator.current_min"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = AuditConfig::from_toml_file(Path::new("/nonexistent/green-audit.toml"));
        assert!(err.is_err_and(|e| e.field == "config"));
    }
}
