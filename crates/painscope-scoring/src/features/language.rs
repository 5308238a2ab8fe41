use super::TextDetector;
use crate::normalize::NormalizedText;

const UNKNOWN: &str = "unknown";
const MIN_WORDS: usize = 3;

const EN_STOPWORDS: &[&str] = &[
    "the", "and", "is", "are", "how", "what", "why", "with", "from", "to", "in",
];
const FR_STOPWORDS: &[&str] = &[
    "le", "la", "les", "est", "pourquoi", "avec", "dans", "des", "une", "un",
];

/// Two-language stopword vote. Returns `"unknown"` for short texts or texts
/// with no stopword hits at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopwordLanguage;

impl StopwordLanguage {
    #[must_use]
    pub fn detect_folded(folded: &str) -> String {
        let words: Vec<&str> = folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if words.len() < MIN_WORDS {
            return UNKNOWN.to_string();
        }

        let en = words.iter().filter(|w| EN_STOPWORDS.contains(w)).count();
        let fr = words.iter().filter(|w| FR_STOPWORDS.contains(w)).count();
        if en == 0 && fr == 0 {
            return UNKNOWN.to_string();
        }
        if en >= fr { "en" } else { "fr" }.to_string()
    }
}

impl TextDetector for StopwordLanguage {
    type Output = String;

    fn version(&self) -> &'static str {
        "stopword_v0"
    }

    fn detect(&self, text: &NormalizedText) -> String {
        Self::detect_folded(text.folded())
    }
}

/// Tags every text with one configured code. Used for single-language sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLanguage(pub String);

impl TextDetector for FixedLanguage {
    type Output = String;

    fn version(&self) -> &'static str {
        "fixed"
    }

    fn detect(&self, _text: &NormalizedText) -> String {
        self.0.clone()
    }
}
