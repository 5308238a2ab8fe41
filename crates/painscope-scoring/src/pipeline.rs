//! Batch pipeline orchestration.
//!
//! Stages run in order: normalize and dedup, score, aggregate per cluster,
//! trend per cluster, recommend. Every stage is pure; this module only
//! wires them together, fans out over independent keys with rayon, and logs
//! at stage boundaries.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use painscope_core::{
    BuildSignalRecommendation, ClusterAggregate, FeatureVector, InputError, PainInstance, Persona,
    PipelineConfig, RawSignal, TrendReport,
};
use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::{aggregate_cluster, ClusterMember, VersionPolicy};
use crate::error::ScoringError;
use crate::features::{extract, DetectorSet};
use crate::ledger::InstanceLedger;
use crate::normalize::{normalize_signal, DedupDecision, DedupIndex, DuplicateReason, NormalizedSignal};
use crate::persona::classify;
use crate::recommend::synthesize;
use crate::scorer::{scorer_for_version, InstanceScorer};
use crate::trend::{aggregate_daily, trend_report, DailyObservation};

/// Outcome of one ingestion batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub accepted: Vec<NormalizedSignal>,
    pub duplicates: Vec<(String, DuplicateReason)>,
    /// Accepted signal id to the other sources already holding its content.
    pub cross_source: Vec<(String, Vec<String>)>,
    pub rejected: Vec<(String, InputError)>,
}

/// A signal after feature extraction and scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSignal {
    pub signal: NormalizedSignal,
    pub features: FeatureVector,
    pub persona: Persona,
    pub instance: PainInstance,
}

impl ScoredSignal {
    #[must_use]
    pub fn to_member(&self) -> ClusterMember {
        ClusterMember {
            instance: self.instance.clone(),
            features: self.features.clone(),
            persona: self.persona,
            source: self.signal.raw.source.clone(),
            created_at: self.signal.raw.created_at,
        }
    }

    #[must_use]
    pub fn to_observation(&self) -> DailyObservation {
        DailyObservation {
            created_at: self.signal.raw.created_at,
            source: self.signal.raw.source.clone(),
            engagement: self.signal.raw.engagement,
            pain_score: self.instance.pain_score,
        }
    }
}

/// Everything known about one cluster at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAnalysis {
    pub cluster_id: i64,
    pub aggregate: ClusterAggregate,
    pub trend: TrendReport,
    pub recommendation: BuildSignalRecommendation,
}

/// Stage wiring for one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    detectors: DetectorSet,
    scorer: Box<dyn InstanceScorer>,
}

impl Pipeline {
    /// Resolve the configured detectors and scorer.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Config`] if a detector name or the algorithm
    /// version is unknown.
    pub fn from_config(config: PipelineConfig) -> Result<Self, ScoringError> {
        let detectors = DetectorSet::from_config(&config.detectors)?;
        let scorer = scorer_for_version(&config.algo_version)?;
        tracing::debug!(
            algo_version = scorer.algo_version(),
            detectors = ?detectors,
            "pipeline configured"
        );
        Ok(Self {
            config,
            detectors,
            scorer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn algo_version(&self) -> &'static str {
        self.scorer.algo_version()
    }

    /// Normalize every signal and run it through the dedup index.
    ///
    /// Rejected text and duplicates are reported, never fatal.
    pub fn ingest(&self, signals: &[RawSignal], index: &mut DedupIndex) -> IngestReport {
        let mut report = IngestReport::default();

        for raw in signals {
            let normalized = match normalize_signal(raw) {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(
                        source = %raw.source,
                        external_id = %raw.external_id,
                        error = %e,
                        "signal rejected at normalization"
                    );
                    report.rejected.push((raw.signal_id(), e));
                    continue;
                }
            };

            match index.admit(&normalized) {
                DedupDecision::Accepted {
                    cross_source_matches,
                } => {
                    if !cross_source_matches.is_empty() {
                        tracing::info!(
                            source = %raw.source,
                            external_id = %raw.external_id,
                            others = ?cross_source_matches,
                            "identical content already seen on other sources"
                        );
                        report
                            .cross_source
                            .push((normalized.signal_id.clone(), cross_source_matches));
                    }
                    report.accepted.push(normalized);
                }
                DedupDecision::Duplicate(reason) => {
                    tracing::debug!(
                        source = %raw.source,
                        external_id = %raw.external_id,
                        ?reason,
                        "duplicate signal skipped"
                    );
                    report.duplicates.push((normalized.signal_id, reason));
                }
            }
        }

        tracing::info!(
            accepted = report.accepted.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejected.len(),
            "ingest batch complete"
        );
        report
    }

    /// Extract features and score every accepted signal, in parallel.
    ///
    /// Output order matches input order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Json`] if a breakdown cannot be hashed.
    pub fn score(&self, accepted: &[NormalizedSignal]) -> Result<Vec<ScoredSignal>, ScoringError> {
        let scored = accepted
            .par_iter()
            .map(|signal| {
                let features = extract(&signal.text, &self.detectors);
                let persona = classify(signal.text.folded());
                let instance = self
                    .scorer
                    .score(&features)
                    .into_instance(&signal.signal_id)?;
                Ok(ScoredSignal {
                    signal: signal.clone(),
                    features,
                    persona,
                    instance,
                })
            })
            .collect::<Result<Vec<_>, ScoringError>>()?;

        tracing::info!(
            count = scored.len(),
            algo_version = self.scorer.algo_version(),
            "scored signals"
        );
        Ok(scored)
    }

    /// Score signals and keep only those whose `(signal_id, algo_version)`
    /// was not already in the ledger.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::score`].
    pub fn score_new(
        &self,
        accepted: &[NormalizedSignal],
        ledger: &mut InstanceLedger,
    ) -> Result<Vec<ScoredSignal>, ScoringError> {
        let scored = self.score(accepted)?;
        let before = scored.len();
        let fresh: Vec<ScoredSignal> = scored
            .into_iter()
            .filter(|s| ledger.insert_if_absent(s.instance.clone()))
            .collect();
        if fresh.len() < before {
            tracing::debug!(
                skipped = before - fresh.len(),
                "instances already present in ledger"
            );
        }
        Ok(fresh)
    }

    /// Aggregate, trend and recommend every assigned cluster.
    ///
    /// `assignments` maps cluster id to member signal ids. An id listed more
    /// than once in a cluster counts once. Ids with no scored signal are
    /// skipped with a warning. Clusters are processed in parallel and
    /// returned in cluster-id order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::VersionMismatch`] if a cluster mixes scorer
    /// versions, or [`ScoringError::InvalidHistory`] from the trend engine.
    pub fn analyze(
        &self,
        scored: &[ScoredSignal],
        assignments: &BTreeMap<i64, Vec<String>>,
        as_of: NaiveDate,
    ) -> Result<Vec<ClusterAnalysis>, ScoringError> {
        let by_id: HashMap<&str, &ScoredSignal> = scored
            .iter()
            .map(|s| (s.signal.signal_id.as_str(), s))
            .collect();

        let clusters: Vec<(i64, Vec<&ScoredSignal>)> = assignments
            .iter()
            .map(|(&cluster_id, signal_ids)| {
                let mut listed = HashSet::new();
                let members = signal_ids
                    .iter()
                    .filter(|id| listed.insert(id.as_str()))
                    .filter_map(|id| {
                        let found = by_id.get(id.as_str()).copied();
                        if found.is_none() {
                            tracing::warn!(cluster_id, signal_id = %id, "assigned signal was not scored");
                        }
                        found
                    })
                    .collect();
                (cluster_id, members)
            })
            .collect();

        clusters
            .par_iter()
            .map(|(cluster_id, members)| self.analyze_cluster(*cluster_id, members, as_of))
            .collect()
    }

    /// Aggregate, trend and recommend one cluster.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::analyze`].
    pub fn analyze_cluster(
        &self,
        cluster_id: i64,
        members: &[&ScoredSignal],
        as_of: NaiveDate,
    ) -> Result<ClusterAnalysis, ScoringError> {
        let cluster_members: Vec<ClusterMember> = members.iter().map(|s| s.to_member()).collect();
        let aggregate = aggregate_cluster(
            cluster_id,
            &cluster_members,
            as_of,
            &VersionPolicy::Strict,
            &self.config.freshness,
        )?;

        let trend = self.trend_for_cluster(cluster_id, members, as_of)?;
        let recommendation = synthesize(&aggregate, &trend, &self.config.calibration);

        tracing::info!(
            cluster_id,
            instances = aggregate.instance_count,
            severity = aggregate.severity,
            recommendation = %recommendation.recommendation,
            "cluster analyzed"
        );

        Ok(ClusterAnalysis {
            cluster_id,
            aggregate,
            trend,
            recommendation,
        })
    }

    /// Daily rollup and trend report for one cluster's members.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidHistory`] if the rollup is inconsistent.
    pub fn trend_for_cluster(
        &self,
        cluster_id: i64,
        members: &[&ScoredSignal],
        as_of: NaiveDate,
    ) -> Result<TrendReport, ScoringError> {
        let observations: Vec<DailyObservation> =
            members.iter().map(|s| s.to_observation()).collect();
        let history = aggregate_daily(cluster_id, &self.config.formula_version, &observations);
        trend_report(
            cluster_id,
            &self.config.formula_version,
            &history,
            as_of,
            &self.config.trend,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn raw(source: &str, external_id: &str, title: &str) -> RawSignal {
        RawSignal {
            external_id: external_id.to_string(),
            source: source.to_string(),
            title: title.to_string(),
            body: "We waste hours on manual invoice reconciliation in a spreadsheet.".to_string(),
            url: None,
            created_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
            engagement: 4,
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::from_config(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn ingest_reports_duplicates_and_rejections() {
        let p = pipeline();
        let mut index = DedupIndex::new();
        let mut binary = raw("reddit", "bin", "x");
        binary.body = "\u{0}\u{0}".to_string();
        let signals = vec![
            raw("reddit", "1", "Invoices are painful"),
            raw("reddit", "1", "Invoices are painful"),
            raw("reddit", "2", "Invoices   ARE painful"),
            raw("hackernews", "9", "Invoices are painful"),
            binary,
        ];
        let report = p.ingest(&signals, &mut index);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(
            report.duplicates,
            vec![
                ("reddit:1".to_string(), DuplicateReason::SameExternalId),
                ("reddit:2".to_string(), DuplicateReason::SameContent),
            ]
        );
        assert_eq!(
            report.cross_source,
            vec![("hackernews:9".to_string(), vec!["reddit".to_string()])]
        );
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].1, InputError::NulByte);
    }

    #[test]
    fn score_preserves_input_order() {
        let p = pipeline();
        let mut index = DedupIndex::new();
        let signals: Vec<RawSignal> = (0..20)
            .map(|i| raw("reddit", &i.to_string(), &format!("Problem number {i}")))
            .collect();
        let report = p.ingest(&signals, &mut index);
        let scored = p.score(&report.accepted).unwrap();
        let ids: Vec<&str> = scored.iter().map(|s| s.instance.signal_id.as_str()).collect();
        let expected: Vec<String> = (0..20).map(|i| format!("reddit:{i}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(scored.iter().all(|s| s.instance.algo_version == "heuristics_v1"));
    }

    #[test]
    fn score_new_skips_ledger_hits() {
        let p = pipeline();
        let mut index = DedupIndex::new();
        let report = p.ingest(&[raw("reddit", "1", "Invoices are painful")], &mut index);
        let mut ledger = InstanceLedger::new();
        assert_eq!(p.score_new(&report.accepted, &mut ledger).unwrap().len(), 1);
        assert_eq!(p.score_new(&report.accepted, &mut ledger).unwrap().len(), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unknown_scorer_version_fails_configuration() {
        let config = PipelineConfig {
            algo_version: "heuristics_v9".to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::from_config(config),
            Err(ScoringError::Config(_))
        ));
    }
}
