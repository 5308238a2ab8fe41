//! Cluster aggregation: severity, persona and monetizability rollups.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use painscope_core::{ClusterAggregate, FeatureVector, FreshnessConfig, PainInstance, Persona};
use tracing::debug;

use crate::error::ScoringError;
use crate::persona::{infer_cluster_persona, PersonaVote};
use crate::trend::instance_weight;

const SEVERITY_COUNT_CAP: f64 = 200.0;
const MONEY_HITS_CAP: f64 = 25.0;
const WORKAROUND_HITS_CAP: f64 = 20.0;
const NEUTRAL_BAND: f64 = 0.10;
const CONFIDENCE_SIZE_CAP: f64 = 30.0;
const CONFIDENCE_SOURCE_CAP: f64 = 3.0;

/// One scored instance together with what the aggregator needs to know
/// about the signal behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMember {
    pub instance: PainInstance,
    pub features: FeatureVector,
    pub persona: Persona,
    pub source: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// How to treat members scored under different algorithm versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Refuse to aggregate mixed versions.
    #[default]
    Strict,
    /// Aggregate only members scored under this version.
    Pin(String),
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// `ln(1 + x) / ln(1 + cap)`, clamped to `[0, 1]`.
pub(crate) fn log_norm(x: f64, cap: f64) -> f64 {
    if cap <= 0.0 {
        return 0.0;
    }
    clamp01(x.max(0.0).ln_1p() / cap.ln_1p())
}

fn reconcile<'a>(
    members: &'a [ClusterMember],
    policy: &VersionPolicy,
) -> Result<Vec<&'a ClusterMember>, ScoringError> {
    match policy {
        VersionPolicy::Strict => {
            if let Some(first) = members.first() {
                let expected = &first.instance.algo_version;
                if let Some(other) = members
                    .iter()
                    .find(|m| &m.instance.algo_version != expected)
                {
                    return Err(ScoringError::VersionMismatch {
                        expected: expected.clone(),
                        found: other.instance.algo_version.clone(),
                    });
                }
            }
            Ok(members.iter().collect())
        }
        VersionPolicy::Pin(version) => Ok(members
            .iter()
            .filter(|m| &m.instance.algo_version == version)
            .collect()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean absolute change of daily mean sentiment between consecutive UTC
/// days, halved so it lands in `[0, 1]`. Undated members are skipped.
fn sentiment_volatility(members: &[&ClusterMember]) -> f64 {
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for m in members {
        if let Some(created_at) = m.created_at {
            by_day
                .entry(created_at.date_naive())
                .or_default()
                .push(m.features.sentiment);
        }
    }
    let daily: Vec<f64> = by_day.values().map(|v| mean(v)).collect();
    let deltas: Vec<f64> = daily.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    clamp01(mean(&deltas) / 2.0)
}

/// How much member sentiment disagrees, `0..=100`.
///
/// Blends sentiment variance (0.55), how evenly members split between
/// positive and negative outside a ±0.1 neutral band (0.30), and
/// day-to-day swings of the daily mean (0.15).
#[must_use]
pub fn contradiction_index(members: &[&ClusterMember]) -> f64 {
    let values: Vec<f64> = members.iter().map(|m| m.features.sentiment).collect();
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(&values);
    let variance = if values.len() > 1 {
        mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>())
    } else {
        0.0
    };

    let positive = values.iter().filter(|&&v| v >= NEUTRAL_BAND).count();
    let negative = values.iter().filter(|&&v| v <= -NEUTRAL_BAND).count();
    let polarization = if positive + negative == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = positive as f64 / (positive + negative) as f64;
        clamp01(1.0 - (ratio - 0.5).abs() / 0.5)
    };

    100.0
        * clamp01(
            0.55 * clamp01(variance)
                + 0.30 * polarization
                + 0.15 * sentiment_volatility(members),
        )
}

/// Structural reliability of a cluster, `0..=100`.
///
/// Four equal parts: size (nothing below three instances, full at 30),
/// corroboration across sources (full at three), persona agreement and
/// sentiment coherence.
#[must_use]
pub fn cluster_confidence(
    instance_count: usize,
    source_count: usize,
    persona_confidence: f64,
    contradiction: f64,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let size = if instance_count <= 2 {
        0.0
    } else {
        clamp01(instance_count as f64 / CONFIDENCE_SIZE_CAP)
    };
    #[allow(clippy::cast_precision_loss)]
    let corroboration = clamp01(source_count as f64 / CONFIDENCE_SOURCE_CAP);
    let agreement = clamp01(persona_confidence);
    let coherence = clamp01(1.0 - contradiction / 100.0);
    25.0 * (size + corroboration + agreement + coherence)
}

/// Roll a cluster's members up into one aggregate as of `as_of`.
///
/// Every member is weighted by freshness, so adding an instance whose
/// pain score is at least the current weighted mean never lowers severity
/// or monetizability. A member repeated under the same
/// `(signal_id, algo_version)` is counted once, and members created after
/// `as_of` are left out.
///
/// An empty (or fully filtered) member set yields
/// [`ClusterAggregate::insufficient`], not an error.
///
/// # Errors
///
/// Returns [`ScoringError::VersionMismatch`] when members mix algorithm
/// versions under [`VersionPolicy::Strict`].
pub fn aggregate_cluster(
    cluster_id: i64,
    members: &[ClusterMember],
    as_of: NaiveDate,
    policy: &VersionPolicy,
    freshness: &FreshnessConfig,
) -> Result<ClusterAggregate, ScoringError> {
    let reconciled = reconcile(members, policy)?;

    let mut seen = HashSet::new();
    let unique: Vec<&ClusterMember> = reconciled
        .into_iter()
        .filter(|m| !m.created_at.is_some_and(|t| t.date_naive() > as_of))
        .filter(|m| seen.insert(m.instance.key()))
        .collect();

    let Some(first) = unique.first() else {
        debug!(cluster_id, "no usable instances, aggregate marked insufficient");
        return Ok(ClusterAggregate::insufficient(cluster_id));
    };
    let algo_version = first.instance.algo_version.clone();

    let weights: Vec<f64> = unique
        .iter()
        .map(|m| instance_weight(m.created_at, as_of, freshness))
        .collect();
    let total_weight = weights.iter().sum::<f64>().max(f64::MIN_POSITIVE);

    let mut weighted_pain = 0.0;
    let mut weighted_money = 0.0;
    let mut weighted_workaround = 0.0;
    let mut factor_sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut votes = Vec::with_capacity(unique.len());
    let mut sources = BTreeSet::new();

    for (member, &w) in unique.iter().zip(&weights) {
        weighted_pain += w * member.instance.pain_score;
        weighted_money += w * f64::from(member.features.money_hits);
        weighted_workaround += w * f64::from(member.features.workaround_hits);
        for (factor, value) in &member.instance.breakdown {
            *factor_sums.entry(factor.clone()).or_default() += w * value;
        }
        votes.push(PersonaVote {
            persona: member.persona,
            weighted_score: w * member.instance.pain_score,
        });
        sources.insert(member.source.as_str());
    }

    let weighted_mean_pain = weighted_pain / total_weight;
    let factor_contributions = factor_sums
        .into_iter()
        .map(|(factor, sum)| (factor, sum / total_weight))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let count_signal = log_norm(unique.len() as f64, SEVERITY_COUNT_CAP);
    let severity = 100.0 * clamp01(0.8 * weighted_mean_pain + 0.2 * count_signal);
    let monetizability = 100.0
        * clamp01(
            0.5 * log_norm(weighted_money, MONEY_HITS_CAP)
                + 0.3 * weighted_mean_pain
                + 0.2 * log_norm(weighted_workaround, WORKAROUND_HITS_CAP),
        );

    let (persona, persona_confidence) = infer_cluster_persona(&votes);
    let contradiction = contradiction_index(&unique);
    let confidence =
        cluster_confidence(unique.len(), sources.len(), persona_confidence, contradiction);

    Ok(ClusterAggregate {
        cluster_id,
        valid: true,
        algo_version: Some(algo_version),
        instance_count: unique.len(),
        source_count: sources.len(),
        severity,
        monetizability,
        persona,
        persona_confidence,
        weighted_mean_pain,
        factor_contributions,
        contradiction,
        confidence,
    })
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
