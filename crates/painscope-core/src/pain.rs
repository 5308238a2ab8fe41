use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scored occurrence of a pain point.
///
/// Identity is `(signal_id, algo_version)`. Re-scoring under a new
/// version produces a second instance; existing ones are never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainInstance {
    pub signal_id: String,
    pub algo_version: String,
    pub pain_score: f64,
    /// Factor name to additive contribution. Values sum to `pain_score`.
    pub breakdown: BTreeMap<String, f64>,
    /// SHA-256 of the canonical breakdown JSON.
    pub breakdown_hash: String,
}

impl PainInstance {
    /// The `(signal_id, algo_version)` key a storage layer must keep unique.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.signal_id, &self.algo_version)
    }

    /// Sum of all breakdown contributions.
    #[must_use]
    pub fn breakdown_total(&self) -> f64 {
        self.breakdown.values().sum()
    }
}
