//! Feature extraction: one fixed-shape vector per normalized text.
//!
//! Every field comes from exactly one detector. Detectors never read each
//! other's output, so a vector can be built in any order or in parallel.

mod language;
mod markers;
mod sentiment;
mod spam;

use std::fmt;

use painscope_core::{ConfigError, DetectorConfig, FeatureVector};

use crate::normalize::NormalizedText;

pub use language::{FixedLanguage, StopwordLanguage};
pub use markers::{count_hits, is_question};
pub use sentiment::{lexicon_score, LexiconSentiment, NeutralSentiment};
pub use spam::{HeuristicSpam, NoSpam};

pub(crate) use markers::{MONEY_WORDS, PAIN_WORDS, WORKAROUND_WORDS};

/// A pluggable text scorer with one capability: score this text.
pub trait TextDetector: Send + Sync {
    type Output;

    /// Version tag. Also the name used to select the detector in config.
    fn version(&self) -> &'static str;

    fn detect(&self, text: &NormalizedText) -> Self::Output;
}

/// The detectors used to fill the non-vocabulary fields of a [`FeatureVector`].
pub struct DetectorSet {
    pub sentiment: Box<dyn TextDetector<Output = f64>>,
    pub spam: Box<dyn TextDetector<Output = u32>>,
    pub language: Box<dyn TextDetector<Output = String>>,
}

impl DetectorSet {
    /// Select detector implementations by configured name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownComponent`] for an unrecognised name.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        let sentiment: Box<dyn TextDetector<Output = f64>> = match config.sentiment.as_str() {
            "lexicon_v1" => Box::new(LexiconSentiment),
            "neutral" => Box::new(NeutralSentiment),
            other => return Err(unknown("sentiment detector", other)),
        };

        let spam: Box<dyn TextDetector<Output = u32>> = match config.spam.as_str() {
            "heuristic_v1" => Box::new(HeuristicSpam::new()),
            "none" => Box::new(NoSpam),
            other => return Err(unknown("spam detector", other)),
        };

        let language: Box<dyn TextDetector<Output = String>> = match config.language.as_str() {
            "stopword_v0" => Box::new(StopwordLanguage),
            other => match other.strip_prefix("fixed:") {
                Some(code) if !code.trim().is_empty() => {
                    Box::new(FixedLanguage(code.trim().to_lowercase()))
                }
                _ => return Err(unknown("language detector", other)),
            },
        };

        Ok(Self {
            sentiment,
            spam,
            language,
        })
    }
}

fn unknown(kind: &'static str, name: &str) -> ConfigError {
    ConfigError::UnknownComponent {
        kind,
        name: name.to_string(),
    }
}

impl Default for DetectorSet {
    fn default() -> Self {
        Self {
            sentiment: Box::new(LexiconSentiment),
            spam: Box::new(HeuristicSpam::new()),
            language: Box::new(StopwordLanguage),
        }
    }
}

impl fmt::Debug for DetectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorSet")
            .field("sentiment", &self.sentiment.version())
            .field("spam", &self.spam.version())
            .field("language", &self.language.version())
            .finish()
    }
}

/// Derive the feature vector for one normalized text.
#[must_use]
pub fn extract(text: &NormalizedText, detectors: &DetectorSet) -> FeatureVector {
    let folded = text.folded();
    FeatureVector {
        is_question: is_question(folded),
        sentiment: detectors.sentiment.detect(text),
        pain_hits: count_hits(folded, PAIN_WORDS),
        workaround_hits: count_hits(folded, WORKAROUND_WORDS),
        money_hits: count_hits(folded, MONEY_WORDS),
        length: u32::try_from(text.display().chars().count()).unwrap_or(u32::MAX),
        language_code: detectors.language.detect(text),
        spam_score: detectors.spam.detect(text),
    }
}
