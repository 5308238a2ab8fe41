use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cluster's activity on one UTC day.
///
/// `(cluster_id, date, formula_version)` identifies the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub cluster_id: i64,
    pub date: NaiveDate,
    pub formula_version: String,
    /// Instances observed that day.
    pub frequency: u64,
    pub engagement: u64,
    pub avg_score: f64,
    pub source_count: u64,
}

impl DailyMetric {
    /// A zero-volume row, used to fill gaps in a history.
    #[must_use]
    pub fn zero(cluster_id: i64, date: NaiveDate, formula_version: &str) -> Self {
        Self {
            cluster_id,
            date,
            formula_version: formula_version.to_string(),
            frequency: 0,
            engagement: 0,
            avg_score: 0.0,
            source_count: 0,
        }
    }
}

/// Per-day trend payload, serialized verbatim at the gateway boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub volume: u64,
    pub growth_rate: f64,
    pub velocity: f64,
    pub breakout_flag: bool,
}

/// Growth over one of the configured fixed windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTrend {
    pub window_days: u32,
    pub recent_volume: u64,
    pub baseline_volume: u64,
    pub growth_rate: f64,
    pub velocity: f64,
}

/// Where a cluster sits in its attention cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityWindow {
    /// Accelerating with little saturation: the best time to build.
    Early,
    Peak,
    /// Attention has plateaued or is rolling over.
    Saturating,
    Unknown,
}

impl OpportunityWindow {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OpportunityWindow::Early => "EARLY",
            OpportunityWindow::Peak => "PEAK",
            OpportunityWindow::Saturating => "SATURATING",
            OpportunityWindow::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for OpportunityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub cluster_id: i64,
    pub formula_version: String,
    pub point: TrendPoint,
    pub windows: Vec<WindowTrend>,
    /// Last-7 vs previous-7 day acceleration, `0.0..=100.0`.
    pub breakout_score: f64,
    /// Days from peak volume until it halved, when the cluster is fading.
    pub half_life_days: Option<f64>,
    /// Growth stalling after a rise, `0.0..=100.0`.
    pub saturation_score: f64,
    /// Short-window growth mapped to `0.0..=100.0`; 50 is flat.
    pub momentum_score: f64,
    /// Timing attractiveness, `0.0..=100.0`.
    pub opportunity_window_score: f64,
    pub opportunity_window: OpportunityWindow,
}
