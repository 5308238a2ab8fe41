use std::path::PathBuf;

use serde::Serialize;

use crate::calibration::Calibration;

/// Time-based down-weighting of older instances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreshnessConfig {
    /// Exponential decay rate per day.
    pub decay_lambda: f64,
    /// Lower bound on any weight; must be in `(0.0, 1.0]`.
    pub floor: f64,
    /// Weight of instances whose creation time is unknown.
    pub undated_weight: f64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            decay_lambda: 0.02,
            floor: 0.05,
            undated_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendConfig {
    /// Fixed window sizes in days, strictly increasing. The first entry is
    /// also the trailing baseline used for daily points.
    pub windows: Vec<u32>,
    pub breakout_growth: f64,
    pub breakout_velocity: f64,
    pub breakout_min_volume: u64,
}

impl TrendConfig {
    #[must_use]
    pub fn baseline_days(&self) -> u32 {
        self.windows.first().copied().unwrap_or(7)
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            windows: vec![7, 30, 90],
            breakout_growth: 1.0,
            breakout_velocity: 0.5,
            breakout_min_volume: 3,
        }
    }
}

/// Names of the text detectors to plug into feature extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorConfig {
    pub sentiment: String,
    pub spam: String,
    pub language: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sentiment: "lexicon_v1".to_string(),
            spam: "heuristic_v1".to_string(),
            language: "stopword_v0".to_string(),
        }
    }
}

/// Everything the pipeline stages read. Passed explicitly into each stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub log_level: String,
    pub algo_version: String,
    pub formula_version: String,
    pub freshness: FreshnessConfig,
    pub trend: TrendConfig,
    pub detectors: DetectorConfig,
    pub calibration_path: Option<PathBuf>,
    pub calibration: Calibration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            algo_version: "heuristics_v1".to_string(),
            formula_version: "trend_v1".to_string(),
            freshness: FreshnessConfig::default(),
            trend: TrendConfig::default(),
            detectors: DetectorConfig::default(),
            calibration_path: None,
            calibration: Calibration::default(),
        }
    }
}
