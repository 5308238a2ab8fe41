//! Signal scoring and cluster aggregation.
//!
//! Each stage is a pure function of its inputs:
//!
//! 1. [`normalize`]: canonical text, content fingerprint, dedup index.
//! 2. [`features`]: fixed-shape feature vector from pluggable detectors.
//! 3. [`scorer`]: versioned pain score with an additive breakdown.
//! 4. [`aggregate`]: severity, persona and monetizability per cluster.
//! 5. [`trend`]: daily rollups, growth and breakout, opportunity window.
//! 6. [`recommend`]: build recommendation with ranked factors.
//!
//! [`pipeline`] wires the stages together for batch runs.

pub mod aggregate;
pub mod error;
pub mod features;
pub mod ledger;
pub mod normalize;
pub mod persona;
pub mod pipeline;
pub mod recommend;
pub mod scorer;
pub mod trend;

pub use aggregate::{
    aggregate_cluster, cluster_confidence, contradiction_index, ClusterMember, VersionPolicy,
};
pub use error::ScoringError;
pub use features::{extract, DetectorSet, TextDetector};
pub use ledger::InstanceLedger;
pub use normalize::{
    fingerprint, fingerprint_text, is_duplicate, normalize, normalize_signal, DedupDecision,
    DedupIndex, DuplicateReason, NormalizedSignal, NormalizedText, SeenSignal,
};
pub use persona::{classify as classify_persona, infer_cluster_persona, PersonaVote};
pub use pipeline::{ClusterAnalysis, IngestReport, Pipeline, ScoredSignal};
pub use recommend::synthesize;
pub use scorer::{scorer_for_version, HeuristicsV1, InstanceScorer, ScoreCard};
pub use trend::{
    aggregate_daily, breakout_score, compute_daily, compute_trend, compute_trend_series,
    compute_windows, densify, estimate_half_life_days, freshness_weight, instance_weight,
    momentum_score, opportunity_window, saturation_score, trend_report, DailyObservation,
};
