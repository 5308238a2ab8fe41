use serde::{Deserialize, Serialize};

/// Fixed-shape features derived from one normalized signal.
///
/// Only ever stored alongside the instance it describes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub is_question: bool,
    /// Lexicon sentiment in `[-1.0, 1.0]`; negative means frustrated.
    pub sentiment: f64,
    pub pain_hits: u32,
    pub workaround_hits: u32,
    pub money_hits: u32,
    /// Character count of the normalized text.
    pub length: u32,
    /// ISO 639-1 code, or `"unknown"` when the detector is not confident.
    pub language_code: String,
    /// Spam likelihood in `0..=100`.
    pub spam_score: u32,
}
