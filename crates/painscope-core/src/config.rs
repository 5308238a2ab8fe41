use std::path::PathBuf;

use crate::app_config::{DetectorConfig, FreshnessConfig, PipelineConfig, TrendConfig};
use crate::calibration::{load_calibration, Calibration};
use crate::ConfigError;

/// Load pipeline configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or the calibration file
/// cannot be loaded.
pub fn load_pipeline_config() -> Result<PipelineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_pipeline_config_from_env()
}

/// Load pipeline configuration from environment variables already in the process.
///
/// Unlike [`load_pipeline_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or the calibration file
/// cannot be loaded.
pub fn load_pipeline_config_from_env() -> Result<PipelineConfig, ConfigError> {
    build_pipeline_config(|key| std::env::var(key))
}

/// Build pipeline configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap`.
fn build_pipeline_config<F>(lookup: F) -> Result<PipelineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = PipelineConfig::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_f64 = |var: &str, default: f64| -> Result<f64, ConfigError> {
        let Ok(raw) = lookup(var) else {
            return Ok(default);
        };
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let non_empty = |var: &str, default: &str| -> Result<String, ConfigError> {
        let value = or_default(var, default).trim().to_string();
        if value.is_empty() {
            Err(invalid(var, "must not be empty".to_string()))
        } else {
            Ok(value)
        }
    };

    let log_level = or_default("PAINSCOPE_LOG_LEVEL", &defaults.log_level);
    let algo_version = non_empty("PAINSCOPE_ALGO_VERSION", &defaults.algo_version)?;
    let formula_version = non_empty("PAINSCOPE_FORMULA_VERSION", &defaults.formula_version)?;

    let decay_lambda = parse_f64("PAINSCOPE_FRESHNESS_LAMBDA", defaults.freshness.decay_lambda)?;
    if decay_lambda < 0.0 {
        return Err(invalid(
            "PAINSCOPE_FRESHNESS_LAMBDA",
            "must be non-negative".to_string(),
        ));
    }
    let floor = parse_f64("PAINSCOPE_FRESHNESS_FLOOR", defaults.freshness.floor)?;
    if floor <= 0.0 || floor > 1.0 {
        return Err(invalid(
            "PAINSCOPE_FRESHNESS_FLOOR",
            "must be within (0, 1]".to_string(),
        ));
    }
    let undated_weight = parse_f64("PAINSCOPE_UNDATED_WEIGHT", defaults.freshness.undated_weight)?;
    if undated_weight <= 0.0 || undated_weight > 1.0 {
        return Err(invalid(
            "PAINSCOPE_UNDATED_WEIGHT",
            "must be within (0, 1]".to_string(),
        ));
    }

    let windows = match lookup("PAINSCOPE_TREND_WINDOWS") {
        Ok(raw) => parse_windows(&raw).map_err(|reason| invalid("PAINSCOPE_TREND_WINDOWS", reason))?,
        Err(_) => defaults.trend.windows.clone(),
    };

    let trend = TrendConfig {
        windows,
        breakout_growth: parse_f64("PAINSCOPE_BREAKOUT_GROWTH", defaults.trend.breakout_growth)?,
        breakout_velocity: parse_f64(
            "PAINSCOPE_BREAKOUT_VELOCITY",
            defaults.trend.breakout_velocity,
        )?,
        breakout_min_volume: parse_u64(
            "PAINSCOPE_BREAKOUT_MIN_VOLUME",
            defaults.trend.breakout_min_volume,
        )?,
    };

    let detectors = DetectorConfig {
        sentiment: non_empty("PAINSCOPE_SENTIMENT_DETECTOR", &defaults.detectors.sentiment)?,
        spam: non_empty("PAINSCOPE_SPAM_DETECTOR", &defaults.detectors.spam)?,
        language: non_empty("PAINSCOPE_LANGUAGE_DETECTOR", &defaults.detectors.language)?,
    };

    let calibration_path = lookup("PAINSCOPE_CALIBRATION_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let calibration = match &calibration_path {
        Some(path) => load_calibration(path)?,
        None => Calibration::default(),
    };

    Ok(PipelineConfig {
        log_level,
        algo_version,
        formula_version,
        freshness: FreshnessConfig {
            decay_lambda,
            floor,
            undated_weight,
        },
        trend,
        detectors,
        calibration_path,
        calibration,
    })
}

/// Parse a comma-separated list of strictly increasing, positive day counts.
fn parse_windows(raw: &str) -> Result<Vec<u32>, String> {
    let mut windows = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let days = part
            .parse::<u32>()
            .map_err(|e| format!("'{part}': {e}"))?;
        if days == 0 {
            return Err("window sizes must be positive".to_string());
        }
        if windows.last().is_some_and(|&prev| days <= prev) {
            return Err("window sizes must be strictly increasing".to_string());
        }
        windows.push(days);
    }
    if windows.is_empty() {
        return Err("at least one window size is required".to_string());
    }
    Ok(windows)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
