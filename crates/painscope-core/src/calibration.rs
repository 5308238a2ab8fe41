//! Decision boundaries for build recommendations.
//!
//! Defaults are compiled in; a YAML file can override any subset of them
//! after calibrating against labelled clusters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Thresholds one tier must clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierBoundary {
    pub min_severity: f64,
    pub min_monetizability: f64,
    pub min_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Calibration {
    /// Severity, monetizability and (growth or breakout) must all pass.
    pub strong_build: TierBoundary,
    /// Severity must pass, plus any of monetizability, growth or breakout.
    pub investigate: TierBoundary,
    /// Below this severity a non-growing cluster is ignored.
    pub monitor_min_severity: f64,
    /// Risk factors at or above this magnitude count toward a downgrade.
    pub risk_magnitude: f64,
    /// A strong build with this many significant risks becomes investigate.
    pub risk_downgrade_count: usize,
    /// Persona confidence under this value is reported as a risk.
    pub low_persona_confidence: f64,
    /// Contradiction above this value (`0..=100`) is reported as a risk.
    pub high_contradiction: f64,
    /// Cluster confidence under this value (`0..=100`) is reported as a risk.
    pub low_confidence: f64,
    /// Cluster confidence under this value caps the verdict at monitor.
    pub min_build_confidence: f64,
    /// Cluster confidence at or above this value counts in favour.
    pub high_confidence: f64,
    /// Factors reported on each side of the recommendation.
    pub top_factors: usize,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            strong_build: TierBoundary {
                min_severity: 60.0,
                min_monetizability: 50.0,
                min_growth: 0.25,
            },
            investigate: TierBoundary {
                min_severity: 40.0,
                min_monetizability: 30.0,
                min_growth: 0.5,
            },
            monitor_min_severity: 20.0,
            risk_magnitude: 0.1,
            risk_downgrade_count: 2,
            low_persona_confidence: 0.3,
            high_contradiction: 50.0,
            low_confidence: 40.0,
            min_build_confidence: 30.0,
            high_confidence: 70.0,
            top_factors: 3,
        }
    }
}

/// Load and validate a calibration file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_calibration(path: &Path) -> Result<Calibration, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CalibrationFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let calibration: Calibration = serde_yaml::from_str(&content)?;
    validate_calibration(&calibration)?;

    Ok(calibration)
}

pub(crate) fn validate_calibration(c: &Calibration) -> Result<(), ConfigError> {
    for (name, tier) in [("strong_build", &c.strong_build), ("investigate", &c.investigate)] {
        check_score(&format!("{name}.min_severity"), tier.min_severity)?;
        check_score(&format!("{name}.min_monetizability"), tier.min_monetizability)?;
        if !tier.min_growth.is_finite() {
            return Err(ConfigError::Validation(format!(
                "{name}.min_growth must be finite"
            )));
        }
    }
    check_score("monitor_min_severity", c.monitor_min_severity)?;
    check_unit("risk_magnitude", c.risk_magnitude)?;
    check_unit("low_persona_confidence", c.low_persona_confidence)?;
    check_score("high_contradiction", c.high_contradiction)?;
    check_score("low_confidence", c.low_confidence)?;
    check_score("min_build_confidence", c.min_build_confidence)?;
    check_score("high_confidence", c.high_confidence)?;

    if c.strong_build.min_severity < c.investigate.min_severity
        || c.strong_build.min_monetizability < c.investigate.min_monetizability
    {
        return Err(ConfigError::Validation(
            "strong_build boundaries must be at least the investigate boundaries".to_string(),
        ));
    }
    if c.monitor_min_severity > c.investigate.min_severity {
        return Err(ConfigError::Validation(
            "monitor_min_severity must not exceed investigate.min_severity".to_string(),
        ));
    }
    if c.min_build_confidence > c.low_confidence || c.low_confidence > c.high_confidence {
        return Err(ConfigError::Validation(
            "confidence boundaries must satisfy min_build <= low <= high".to_string(),
        ));
    }
    if c.risk_downgrade_count == 0 {
        return Err(ConfigError::Validation(
            "risk_downgrade_count must be at least 1".to_string(),
        ));
    }
    if c.top_factors == 0 {
        return Err(ConfigError::Validation(
            "top_factors must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn check_score(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be within 0..=100, got {value}"
        )))
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be within 0..=1, got {value}"
        )))
    }
}

#[cfg(test)]
#[path = "calibration_test.rs"]
mod tests;
