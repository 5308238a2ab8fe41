//! Spam likelihood from link density, promo phrasing and word repetition.

use std::collections::HashMap;

use regex::Regex;

use super::TextDetector;
use crate::normalize::NormalizedText;

#[derive(Debug, Clone)]
pub struct HeuristicSpam {
    url_re: Regex,
    promo_re: Regex,
    word_re: Regex,
}

impl HeuristicSpam {
    #[must_use]
    pub fn new() -> Self {
        Self {
            url_re: Regex::new(r"(?i)https?://\S+").expect("valid url regex"),
            promo_re: Regex::new(
                r"(?i)\b(sign up|subscribe|buy now|limited offer|discount|use my code|promo code)\b",
            )
            .expect("valid promo regex"),
            word_re: Regex::new(r"\b\w+\b").expect("valid word regex"),
        }
    }

    /// Score `0..=100`. Empty text scores 100: there is nothing to trust.
    #[must_use]
    pub fn score(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 100;
        }

        let urls = self.url_re.find_iter(text).count();
        let promo_hits = self.promo_re.find_iter(text).count();

        let lowered = text.to_lowercase();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut word_count = 0_usize;
        for m in self.word_re.find_iter(&lowered) {
            *counts.entry(m.as_str()).or_default() += 1;
            word_count += 1;
        }

        #[allow(clippy::cast_precision_loss)]
        let (repetition_ratio, link_density, promo) = {
            let words = word_count.max(1) as f64;
            let most_common = counts.values().copied().max().unwrap_or(0) as f64;
            let repetition = if word_count == 0 { 0.0 } else { most_common / words };
            (repetition, urls as f64 / words, promo_hits as f64 / 3.0)
        };

        let score01 = 0.35 * (link_density * 10.0).clamp(0.0, 1.0)
            + 0.30 * promo.clamp(0.0, 1.0)
            + 0.35 * (repetition_ratio * 5.0).clamp(0.0, 1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = (score01.clamp(0.0, 1.0) * 100.0).round() as u32;
        score
    }
}

impl Default for HeuristicSpam {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDetector for HeuristicSpam {
    type Output = u32;

    fn version(&self) -> &'static str {
        "heuristic_v1"
    }

    fn detect(&self, text: &NormalizedText) -> u32 {
        self.score(text.display())
    }
}

/// Treats every text as clean. For curated sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpam;

impl TextDetector for NoSpam {
    type Output = u32;

    fn version(&self) -> &'static str {
        "none"
    }

    fn detect(&self, _text: &NormalizedText) -> u32 {
        0
    }
}
