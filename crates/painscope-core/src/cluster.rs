use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A group of pain instances judged to describe the same problem.
///
/// Membership is assigned outside the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainCluster {
    pub id: i64,
    pub vertical_id: i64,
    pub title: String,
}

/// Who is affected by a pain point.
///
/// Variants are declared in lexical order of their labels so the derived
/// `Ord` matches label ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    EnterpriseEmployee,
    Founder,
    Freelancer,
    Hobbyist,
    Operator,
    Unknown,
}

impl Persona {
    pub const ALL: [Persona; 6] = [
        Persona::EnterpriseEmployee,
        Persona::Founder,
        Persona::Freelancer,
        Persona::Hobbyist,
        Persona::Operator,
        Persona::Unknown,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Persona::EnterpriseEmployee => "enterprise_employee",
            Persona::Founder => "founder",
            Persona::Freelancer => "freelancer",
            Persona::Hobbyist => "hobbyist",
            Persona::Operator => "operator",
            Persona::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cluster-level rollup of its scored instances.
///
/// Consumers must check [`ClusterAggregate::valid`] before trusting any
/// score: an aggregate built from no usable instances is returned with
/// `valid == false` and zeroed scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAggregate {
    pub cluster_id: i64,
    pub valid: bool,
    /// Version shared by every instance that went into the aggregate.
    pub algo_version: Option<String>,
    pub instance_count: usize,
    pub source_count: usize,
    /// Aggregate distress magnitude, `0.0..=100.0`.
    pub severity: f64,
    /// Willingness-to-pay proxy, `0.0..=100.0`.
    pub monetizability: f64,
    pub persona: Persona,
    /// Winner's share of the weighted score mass, `0.0..=1.0`.
    pub persona_confidence: f64,
    /// Freshness-weighted mean pain score.
    pub weighted_mean_pain: f64,
    /// Freshness-weighted mean of each scorer breakdown factor.
    pub factor_contributions: BTreeMap<String, f64>,
    /// How much member sentiment disagrees, `0.0..=100.0`.
    pub contradiction: f64,
    /// Structural reliability of the cluster, `0.0..=100.0`.
    pub confidence: f64,
}

impl ClusterAggregate {
    #[must_use]
    pub fn insufficient(cluster_id: i64) -> Self {
        Self {
            cluster_id,
            valid: false,
            algo_version: None,
            instance_count: 0,
            source_count: 0,
            severity: 0.0,
            monetizability: 0.0,
            persona: Persona::Unknown,
            persona_confidence: 0.0,
            weighted_mean_pain: 0.0,
            factor_contributions: BTreeMap::new(),
            contradiction: 0.0,
            confidence: 0.0,
        }
    }
}
