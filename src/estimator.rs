//! Household appliance energy estimator.
//!
//! A stateless calculator over a fixed appliance catalog. Each appliance line
//! contributes `rating_w * count * hours_per_day / 1000` kWh per day, priced
//! and attributed with the same tariff rules as the telemetry pipeline.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::audit::types::Tariff;

/// One appliance category and its standard power ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceCategory {
    pub name: &'static str,
    /// Standard ratings (W). Empty means the rating is user supplied.
    pub ratings_w: &'static [f64],
}

impl ApplianceCategory {
    /// Returns `true` when the category takes a free-form rating.
    pub fn is_custom(&self) -> bool {
        self.ratings_w.is_empty()
    }
}

/// The fixed appliance catalog.
pub const CATALOG: &[ApplianceCategory] = &[
    ApplianceCategory { name: "Tube Light", ratings_w: &[20.0, 40.0, 60.0] },
    ApplianceCategory { name: "Fan", ratings_w: &[50.0, 75.0, 90.0] },
    ApplianceCategory { name: "Electric Bell", ratings_w: &[10.0] },
    ApplianceCategory { name: "Fridge", ratings_w: &[150.0, 250.0, 400.0] },
    ApplianceCategory { name: "AC", ratings_w: &[1000.0, 1500.0, 2000.0] },
    ApplianceCategory { name: "Washing Machine", ratings_w: &[500.0, 1000.0] },
    ApplianceCategory { name: "LED Light", ratings_w: &[5.0, 9.0, 12.0] },
    ApplianceCategory { name: "Electric Stove", ratings_w: &[1000.0, 1500.0] },
    ApplianceCategory { name: "Electric Heater/Geyser", ratings_w: &[1500.0, 2000.0] },
    ApplianceCategory { name: "Iron Box", ratings_w: &[1000.0, 1500.0] },
    ApplianceCategory { name: "Others", ratings_w: &[] },
];

/// Looks up a catalog category by name, ignoring ASCII case.
pub fn category(name: &str) -> Option<&'static ApplianceCategory> {
    CATALOG.iter().find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

/// Errors raised while loading or evaluating an estimate.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("cannot read estimate input \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid estimate input: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown appliance category \"{0}\"")]
    UnknownCategory(String),

    #[error("{name}: rating {rating_w} W is not one of {allowed:?}")]
    UnsupportedRating {
        name: String,
        rating_w: f64,
        allowed: Vec<f64>,
    },

    #[error("{0}: a custom power rating is required")]
    MissingCustomRating(String),

    #[error("{name}: {field} must be a finite number >= 0")]
    InvalidQuantity { name: String, field: &'static str },

    #[error("renewable share must be within 0..=100, got {0}")]
    InvalidShare(f64),
}

/// Usage of one appliance category.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplianceUsage {
    /// Catalog category name.
    pub name: String,
    /// Number of units.
    #[serde(default)]
    pub count: u32,
    /// Rating per unit (W). Defaults to the first standard rating.
    pub rating_w: Option<f64>,
    /// Daily usage per unit (hours).
    #[serde(default)]
    pub hours_per_day: f64,
}

impl ApplianceUsage {
    pub fn new(name: impl Into<String>, count: u32, rating_w: Option<f64>, hours_per_day: f64) -> Self {
        Self {
            name: name.into(),
            count,
            rating_w,
            hours_per_day,
        }
    }
}

/// Estimator input: a renewable share and appliance lines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimateInput {
    /// Renewable share (%), 0-100.
    #[serde(default)]
    pub renewable_share: f64,
    #[serde(default, rename = "appliance")]
    pub appliances: Vec<ApplianceUsage>,
}

impl EstimateInput {
    /// Parses estimator input from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an `EstimateError` if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, EstimateError> {
        let content = fs::read_to_string(path).map_err(|source| EstimateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses estimator input from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an `EstimateError` if the TOML is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, EstimateError> {
        Ok(toml::from_str(s)?)
    }
}

/// Daily figures for one appliance line.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateLine {
    pub name: &'static str,
    pub count: u32,
    pub rating_w: f64,
    pub hours_per_day: f64,
    pub energy_kwh: f64,
    pub cost: f64,
    pub co2_kg: f64,
}

/// Daily totals across all appliance lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub lines: Vec<EstimateLine>,
    pub renewable_share: f64,
    pub total_energy_kwh: f64,
    pub total_cost: f64,
    pub total_co2_kg: f64,
    pub total_co2_saved_kg: f64,
    pub total_carbon_credits: f64,
}

impl Estimate {
    /// Evaluates appliance usage against a tariff.
    ///
    /// # Errors
    ///
    /// Returns an `EstimateError` for an unknown category, a rating that is
    /// not in the catalog, a missing custom rating, a negative or non-finite
    /// quantity, or a share outside `0..=100`.
    pub fn evaluate(input: &EstimateInput, tariff: &Tariff) -> Result<Self, EstimateError> {
        let share = input.renewable_share;
        if !(0.0..=100.0).contains(&share) {
            return Err(EstimateError::InvalidShare(share));
        }

        let mut estimate = Self {
            lines: Vec::with_capacity(input.appliances.len()),
            renewable_share: share,
            total_energy_kwh: 0.0,
            total_cost: 0.0,
            total_co2_kg: 0.0,
            total_co2_saved_kg: 0.0,
            total_carbon_credits: 0.0,
        };

        for usage in &input.appliances {
            let cat = category(&usage.name)
                .ok_or_else(|| EstimateError::UnknownCategory(usage.name.clone()))?;
            let rating_w = resolve_rating(cat, usage.rating_w)?;
            if !usage.hours_per_day.is_finite() || usage.hours_per_day < 0.0 {
                return Err(EstimateError::InvalidQuantity {
                    name: cat.name.to_string(),
                    field: "hours_per_day",
                });
            }

            let energy_kwh = rating_w * usage.hours_per_day * f64::from(usage.count) / 1000.0;
            let a = tariff.attribute(energy_kwh, share);

            estimate.total_energy_kwh += energy_kwh;
            estimate.total_cost += a.cost;
            estimate.total_co2_kg += a.co2_kg;
            estimate.total_co2_saved_kg += a.co2_saved_kg;
            estimate.total_carbon_credits += a.credits;
            estimate.lines.push(EstimateLine {
                name: cat.name,
                count: usage.count,
                rating_w,
                hours_per_day: usage.hours_per_day,
                energy_kwh,
                cost: a.cost,
                co2_kg: a.co2_kg,
            });
        }

        Ok(estimate)
    }
}

fn resolve_rating(cat: &ApplianceCategory, requested: Option<f64>) -> Result<f64, EstimateError> {
    if cat.is_custom() {
        let rating = requested.ok_or_else(|| EstimateError::MissingCustomRating(cat.name.to_string()))?;
        if !rating.is_finite() || rating < 0.0 {
            return Err(EstimateError::InvalidQuantity {
                name: cat.name.to_string(),
                field: "rating_w",
            });
        }
        return Ok(rating);
    }

    match requested {
        None => Ok(cat.ratings_w[0]),
        Some(r) if cat.ratings_w.contains(&r) => Ok(r),
        Some(r) => Err(EstimateError::UnsupportedRating {
            name: cat.name.to_string(),
            rating_w: r,
            allowed: cat.ratings_w.to_vec(),
        }),
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Household Energy Estimate ---")?;
        for line in &self.lines {
            writeln!(
                f,
                "{:<24} {:>3} x {:>6.0} W x {:>4.1} h = {:>7.2} kWh/day",
                line.name, line.count, line.rating_w, line.hours_per_day, line.energy_kwh
            )?;
        }
        writeln!(f, "Total energy consumed: {:.2} kWh/day", self.total_energy_kwh)?;
        writeln!(f, "Total cost:            {:.2} INR/day", self.total_cost)?;
        writeln!(f, "Total CO2 emission:    {:.2} kg/day", self.total_co2_kg)?;
        writeln!(f, "CO2 saved:             {:.2} kg/day", self.total_co2_saved_kg)?;
        write!(f, "Carbon credits earned: {:.2} /day", self.total_carbon_credits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(share: f64, appliances: Vec<ApplianceUsage>) -> EstimateInput {
        EstimateInput {
            renewable_share: share,
            appliances,
        }
    }

    #[test]
    fn two_fans_four_hours() {
        let est = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("Fan", 2, Some(75.0), 4.0)]),
            &Tariff::default(),
        )
        .expect("fan estimate should evaluate");
        assert!((est.total_energy_kwh - 0.6).abs() < 1e-12);
        assert!((est.total_cost - 4.44).abs() < 1e-12);
        assert!((est.total_co2_kg - 0.492).abs() < 1e-12);
        assert_eq!(est.total_co2_saved_kg, 0.0);
        assert_eq!(est.total_carbon_credits, 0.0);
    }

    #[test]
    fn standard_rating_defaults_to_first_entry() {
        let est = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("fridge", 1, None, 24.0)]),
            &Tariff::default(),
        )
        .expect("fridge estimate should evaluate");
        assert_eq!(est.lines[0].rating_w, 150.0);
        assert_eq!(est.lines[0].name, "Fridge");
        assert!((est.total_energy_kwh - 3.6).abs() < 1e-12);
    }

    #[test]
    fn renewable_share_attributes_savings() {
        let est = Estimate::evaluate(
            &input(50.0, vec![ApplianceUsage::new("AC", 1, Some(1000.0), 2.0)]),
            &Tariff::default(),
        )
        .expect("AC estimate should evaluate");
        // 2 kWh, half renewable -> 1 kWh * 0.82
        assert!((est.total_co2_saved_kg - 0.82).abs() < 1e-12);
        assert!((est.total_carbon_credits - 0.82 * 0.15).abs() < 1e-12);
    }

    #[test]
    fn custom_category_requires_rating() {
        let err = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("Others", 1, None, 1.0)]),
            &Tariff::default(),
        );
        assert!(matches!(err, Err(EstimateError::MissingCustomRating(_))));

        let ok = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("Others", 3, Some(120.0), 5.0)]),
            &Tariff::default(),
        );
        assert!(ok.is_ok_and(|e| (e.total_energy_kwh - 1.8).abs() < 1e-12));
    }

    #[test]
    fn rating_outside_catalog_is_rejected() {
        let err = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("Fan", 1, Some(80.0), 1.0)]),
            &Tariff::default(),
        );
        assert!(matches!(err, Err(EstimateError::UnsupportedRating { .. })));
    }

    #[test]
    fn unknown_category_and_bad_share_are_rejected() {
        let err = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("Toaster", 1, None, 1.0)]),
            &Tariff::default(),
        );
        assert!(matches!(err, Err(EstimateError::UnknownCategory(_))));

        let err = Estimate::evaluate(&input(120.0, Vec::new()), &Tariff::default());
        assert!(matches!(err, Err(EstimateError::InvalidShare(_))));
    }

    #[test]
    fn negative_hours_are_rejected() {
        let err = Estimate::evaluate(
            &input(0.0, vec![ApplianceUsage::new("LED Light", 1, Some(9.0), -1.0)]),
            &Tariff::default(),
        );
        assert!(matches!(err, Err(EstimateError::InvalidQuantity { field: "hours_per_day", .. })));
    }

    #[test]
    fn toml_input_parses() {
        let toml = r#"
renewable_share = 10

[[appliance]]
name = "Tube Light"
count = 4
rating_w = 40
hours_per_day = 6

[[appliance]]
name = "Others"
count = 1
rating_w = 300
hours_per_day = 0.5
"#;
        let parsed = EstimateInput::from_toml_str(toml).expect("input should parse");
        assert_eq!(parsed.appliances.len(), 2);
        assert_eq!(parsed.renewable_share, 10.0);
        let est = Estimate::evaluate(&parsed, &Tariff::default()).expect("should evaluate");
        // 4*40*6/1000 = 0.96, 300*0.5/1000 = 0.15
        assert!((est.total_energy_kwh - 1.11).abs() < 1e-9);
    }

    #[test]
    fn catalog_has_single_custom_category() {
        let custom: Vec<_> = CATALOG.iter().filter(|c| c.is_custom()).collect();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].name, "Others");
    }
}
