use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuild,
    Investigate,
    Monitor,
    Ignore,
    InsufficientData,
}

impl Recommendation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongBuild => "STRONG_BUILD",
            Recommendation::Investigate => "INVESTIGATE",
            Recommendation::Monitor => "MONITOR",
            Recommendation::Ignore => "IGNORE",
            Recommendation::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build/invest verdict for one cluster, synthesized on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSignalRecommendation {
    pub recommendation: Recommendation,
    pub reasoning_summary: String,
    /// Most significant first.
    pub top_positive_factors: Vec<String>,
    /// Most significant first.
    pub top_risk_factors: Vec<String>,
}
