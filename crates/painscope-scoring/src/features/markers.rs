//! Closed vocabularies and the counters that run over them.

pub(crate) const PAIN_WORDS: &[&str] = &[
    "pain",
    "struggle",
    "annoy",
    "frustrat",
    "hate",
    "issue",
    "problem",
    "broken",
    "impossible",
    "can't",
    "cannot",
    "won't",
    "hard",
    "difficult",
    "time-consuming",
    "waste",
    "expensive",
];

pub(crate) const WORKAROUND_WORDS: &[&str] = &[
    "workaround",
    "hack",
    "script",
    "manual",
    "spreadsheet",
    "excel",
    "google sheet",
    "copy paste",
];

pub(crate) const MONEY_WORDS: &[&str] = &[
    "$",
    "usd",
    "eur",
    "€",
    "pricing",
    "price",
    "cost",
    "budget",
    "pay",
    "subscription",
];

/// Phrases that open a question. Multi-word entries must match as a whole.
pub(crate) const INTERROGATIVES: &[&str] = &[
    "how",
    "why",
    "what",
    "which",
    "where",
    "when",
    "who",
    "anyone",
    "does anyone",
    "is there",
    "can i",
    "can you",
    "should i",
];

/// Non-overlapping occurrences of each term in `folded`, summed over the
/// vocabulary. Saturates at `u32::MAX`.
#[must_use]
pub fn count_hits(folded: &str, vocabulary: &[&str]) -> u32 {
    let total: usize = vocabulary
        .iter()
        .map(|term| folded.matches(*term).count())
        .sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// True if the text ends with `?` or starts with an interrogative phrase
/// followed by a word boundary.
#[must_use]
pub fn is_question(folded: &str) -> bool {
    let trimmed = folded.trim();
    if trimmed.ends_with('?') {
        return true;
    }
    INTERROGATIVES.iter().any(|phrase| {
        trimmed
            .strip_prefix(*phrase)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
    })
}
