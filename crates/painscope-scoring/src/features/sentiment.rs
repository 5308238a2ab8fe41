//! Lexicon sentiment for pain-point text.

use super::TextDetector;
use crate::normalize::NormalizedText;

/// Word weights tuned for complaint threads.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("great", 0.4),
    ("good", 0.3),
    ("love", 0.5),
    ("loved", 0.5),
    ("awesome", 0.5),
    ("best", 0.5),
    ("easy", 0.3),
    ("helpful", 0.3),
    ("recommend", 0.4),
    ("solved", 0.4),
    ("works", 0.2),
    ("simple", 0.2),
    ("fast", 0.2),
    ("thanks", 0.2),
    ("happy", 0.4),
    // Negative signals
    ("frustrating", -0.6),
    ("frustrated", -0.6),
    ("annoying", -0.5),
    ("annoyed", -0.5),
    ("hate", -0.7),
    ("broken", -0.5),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("worst", -0.6),
    ("painful", -0.5),
    ("impossible", -0.5),
    ("nightmare", -0.7),
    ("tedious", -0.4),
    ("confusing", -0.4),
    ("struggling", -0.5),
    ("stuck", -0.4),
    ("slow", -0.3),
    ("buggy", -0.4),
    ("fails", -0.4),
    ("failed", -0.4),
    ("waste", -0.4),
    ("expensive", -0.3),
    ("problem", -0.3),
    ("issue", -0.2),
];

/// Score a text string using the lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    let mut score = 0.0_f64;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        for &(lex_word, weight) in LEXICON {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentiment;

impl TextDetector for LexiconSentiment {
    type Output = f64;

    fn version(&self) -> &'static str {
        "lexicon_v1"
    }

    fn detect(&self, text: &NormalizedText) -> f64 {
        lexicon_score(text.folded())
    }
}

/// Always neutral. For sources where sentiment is meaningless, such as
/// changelogs or paper abstracts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSentiment;

impl TextDetector for NeutralSentiment {
    type Output = f64;

    fn version(&self) -> &'static str {
        "neutral"
    }

    fn detect(&self, _text: &NormalizedText) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_returns_zero() {
        assert_eq!(lexicon_score(""), 0.0);
    }

    #[test]
    fn unknown_text_returns_zero() {
        assert_eq!(lexicon_score("the quick brown fox"), 0.0);
    }

    #[test]
    fn frustration_returns_negative() {
        let score = lexicon_score("this export is so frustrating");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn praise_returns_positive() {
        let score = lexicon_score("great tool, would recommend");
        assert!(score > 0.0, "expected positive score, got {score}");
    }

    #[test]
    fn score_clamps_to_negative_one() {
        let text = "hate terrible awful worst nightmare broken";
        assert_eq!(lexicon_score(text), -1.0);
    }

    #[test]
    fn punctuation_stripped_from_words() {
        let score = lexicon_score("broken!!!");
        assert!(score < 0.0, "expected negative score for 'broken!!!', got {score}");
    }

    #[test]
    fn neutral_detector_ignores_text() {
        let text = crate::normalize::normalize("I hate this").unwrap();
        assert_eq!(NeutralSentiment.detect(&text), 0.0);
        assert!(LexiconSentiment.detect(&text) < 0.0);
    }
}
