//! Instance scoring: feature vector in, pain score and breakdown out.

use std::collections::BTreeMap;

use painscope_core::{ConfigError, FeatureVector, PainInstance};
use sha2::{Digest, Sha256};

use crate::error::ScoringError;

/// Output of a scorer before it is bound to a signal.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub algo_version: &'static str,
    pub pain_score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

impl ScoreCard {
    /// Bind this card to a signal, producing a persistable instance.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Json`] if the breakdown cannot be serialized.
    pub fn into_instance(self, signal_id: &str) -> Result<PainInstance, ScoringError> {
        let breakdown_hash = breakdown_hash(&self.breakdown)?;
        Ok(PainInstance {
            signal_id: signal_id.to_string(),
            algo_version: self.algo_version.to_string(),
            pain_score: self.pain_score,
            breakdown: self.breakdown,
            breakdown_hash,
        })
    }
}

/// A versioned pain formula. The version is part of the output identity,
/// so every implementation hardcodes its own.
pub trait InstanceScorer: Send + Sync {
    fn algo_version(&self) -> &'static str;

    fn score(&self, features: &FeatureVector) -> ScoreCard;
}

/// Resolve a configured algorithm version to its scorer.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownComponent`] for versions this build does
/// not know.
pub fn scorer_for_version(version: &str) -> Result<Box<dyn InstanceScorer>, ConfigError> {
    match version {
        HeuristicsV1::VERSION => Ok(Box::new(HeuristicsV1)),
        other => Err(ConfigError::UnknownComponent {
            kind: "scorer version",
            name: other.to_string(),
        }),
    }
}

/// SHA-256 hex of the breakdown serialized as JSON with sorted keys.
///
/// # Errors
///
/// Returns [`ScoringError::Json`] if serialization fails.
pub fn breakdown_hash(breakdown: &BTreeMap<String, f64>) -> Result<String, ScoringError> {
    let canonical = serde_json::to_string(breakdown)?;
    Ok(format!("{:x}", Sha256::digest(canonical.as_bytes())))
}

/// Additive keyword-density formula.
///
/// Factors: `base`, `question`, `frustration`, `pain_keywords`,
/// `workaround`, `money`, and a negative `spam_penalty` that removes a
/// share of every non-base factor. The positive weights sum to 1.0, so the
/// score always lands in `[0.05, 1.0]` without clamping.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicsV1;

impl HeuristicsV1 {
    pub const VERSION: &'static str = "heuristics_v1";

    const BASE: f64 = 0.05;
    const QUESTION: f64 = 0.10;
    const FRUSTRATION: f64 = 0.20;
    const PAIN: f64 = 0.30;
    const WORKAROUND: f64 = 0.20;
    const MONEY: f64 = 0.15;

    /// Characters per "unit" of text when normalizing hit counts.
    const DENSITY_UNIT: f64 = 280.0;

    fn density(hits: u32, length: u32) -> f64 {
        let units = 1.0 + f64::from(length) / Self::DENSITY_UNIT;
        (f64::from(hits) / units).min(1.0)
    }
}

impl InstanceScorer for HeuristicsV1 {
    fn algo_version(&self) -> &'static str {
        Self::VERSION
    }

    fn score(&self, f: &FeatureVector) -> ScoreCard {
        let sentiment = if f.sentiment.is_finite() {
            f.sentiment.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let question = if f.is_question { Self::QUESTION } else { 0.0 };
        let frustration = Self::FRUSTRATION * (-sentiment).max(0.0);
        let pain = Self::PAIN * Self::density(f.pain_hits, f.length);
        let workaround = Self::WORKAROUND * Self::density(f.workaround_hits, f.length);
        let money = Self::MONEY * Self::density(f.money_hits, f.length);

        let signal = question + frustration + pain + workaround + money;
        let spam_share = (f64::from(f.spam_score) / 100.0).min(1.0);
        let spam_penalty = -spam_share * signal;

        let breakdown: BTreeMap<String, f64> = [
            ("base", Self::BASE),
            ("question", question),
            ("frustration", frustration),
            ("pain_keywords", pain),
            ("workaround", workaround),
            ("money", money),
            ("spam_penalty", spam_penalty),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        let pain_score = breakdown.values().sum();

        ScoreCard {
            algo_version: Self::VERSION,
            pain_score,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complaint() -> FeatureVector {
        FeatureVector {
            is_question: true,
            sentiment: -0.6,
            pain_hits: 3,
            workaround_hits: 1,
            money_hits: 1,
            length: 140,
            language_code: "en".to_string(),
            spam_score: 0,
        }
    }

    #[test]
    fn zero_length_scores_minimum() {
        let card = HeuristicsV1.score(&FeatureVector::default());
        assert!((card.pain_score - 0.05).abs() < 1e-12);
        assert!(!card.pain_score.is_nan());
    }

    #[test]
    fn breakdown_sums_to_score() {
        let card = HeuristicsV1.score(&complaint());
        let total: f64 = card.breakdown.values().sum();
        assert!((total - card.pain_score).abs() < 1e-9);
        assert_eq!(card.breakdown.len(), 7);
    }

    #[test]
    fn complaint_scores_higher_than_neutral() {
        let neutral = FeatureVector {
            length: 140,
            ..FeatureVector::default()
        };
        assert!(HeuristicsV1.score(&complaint()).pain_score > HeuristicsV1.score(&neutral).pain_score);
    }

    #[test]
    fn full_spam_removes_all_signal() {
        let mut fv = complaint();
        fv.spam_score = 100;
        let card = HeuristicsV1.score(&fv);
        assert!((card.pain_score - 0.05).abs() < 1e-9);
        assert!(card.breakdown["spam_penalty"] < 0.0);
    }

    #[test]
    fn score_never_exceeds_one() {
        let fv = FeatureVector {
            is_question: true,
            sentiment: -1.0,
            pain_hits: 50,
            workaround_hits: 50,
            money_hits: 50,
            length: 10,
            language_code: "en".to_string(),
            spam_score: 0,
        };
        let card = HeuristicsV1.score(&fv);
        assert!(card.pain_score <= 1.0 + 1e-12);
    }

    #[test]
    fn positive_sentiment_adds_no_frustration() {
        let mut fv = complaint();
        fv.sentiment = 0.8;
        assert_eq!(HeuristicsV1.score(&fv).breakdown["frustration"], 0.0);
    }

    #[test]
    fn resolves_known_version() {
        let scorer = scorer_for_version("heuristics_v1").unwrap();
        assert_eq!(scorer.algo_version(), "heuristics_v1");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result = scorer_for_version("heuristics_v0");
        assert!(matches!(
            result,
            Err(ConfigError::UnknownComponent { kind: "scorer version", .. })
        ));
    }

    #[test]
    fn instance_carries_version_and_stable_hash() {
        let a = HeuristicsV1.score(&complaint()).into_instance("reddit:1").unwrap();
        let b = HeuristicsV1.score(&complaint()).into_instance("reddit:1").unwrap();
        assert_eq!(a.algo_version, "heuristics_v1");
        assert_eq!(a.breakdown_hash, b.breakdown_hash);
        assert_eq!(a.breakdown_hash.len(), 64);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_changes_with_breakdown() {
        let a = HeuristicsV1.score(&complaint()).into_instance("x:1").unwrap();
        let b = HeuristicsV1.score(&FeatureVector::default()).into_instance("x:1").unwrap();
        assert_ne!(a.breakdown_hash, b.breakdown_hash);
    }
}
