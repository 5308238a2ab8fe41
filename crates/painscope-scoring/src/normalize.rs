//! Text canonicalization, content fingerprinting and ingestion dedup.
//!
//! Normalization collapses whitespace (Unicode spaces such as U+00A0,
//! U+2007 and U+202F included) and drops zero-width characters. Case is
//! kept in the display form and folded only for fingerprinting and
//! detection.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use painscope_core::{ContentFingerprint, InputError, RawSignal};
use serde::{Deserialize, Serialize};

/// Share of control or replacement characters above which text is treated
/// as binary.
const BINARY_CONTROL_RATIO: f64 = 0.10;

/// Text after whitespace canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    display: String,
    folded: String,
}

impl NormalizedText {
    /// Case-preserving form for display.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Lower-cased form used for fingerprints and detectors.
    #[must_use]
    pub fn folded(&self) -> &str {
        &self.folded
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }

    /// Joins two normalized texts with a single space, skipping empties.
    #[must_use]
    pub fn join(first: &Self, second: &Self) -> Self {
        match (first.is_empty(), second.is_empty()) {
            (_, true) => first.clone(),
            (true, false) => second.clone(),
            (false, false) => Self {
                display: format!("{} {}", first.display, second.display),
                folded: format!("{} {}", first.folded, second.folded),
            },
        }
    }
}

/// Canonicalize raw text.
///
/// Empty or whitespace-only input normalizes to the empty text.
///
/// # Errors
///
/// Returns [`InputError`] when the text contains a NUL character or looks
/// like binary data.
pub fn normalize(text: &str) -> Result<NormalizedText, InputError> {
    check_textual(text)?;

    let mut display = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if is_zero_width(c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !display.is_empty();
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space {
            display.push(' ');
            pending_space = false;
        }
        display.push(c);
    }

    let folded = display.to_lowercase();
    Ok(NormalizedText { display, folded })
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

fn check_textual(text: &str) -> Result<(), InputError> {
    if text.contains('\0') {
        return Err(InputError::NulByte);
    }

    let mut total = 0_usize;
    let mut suspicious = 0_usize;
    for c in text.chars() {
        total += 1;
        if c == '\u{FFFD}' || (c.is_control() && !matches!(c, '\n' | '\r' | '\t')) {
            suspicious += 1;
        }
    }
    if total == 0 {
        return Ok(());
    }

    #[allow(clippy::cast_precision_loss)]
    let control_ratio = suspicious as f64 / total as f64;
    if control_ratio > BINARY_CONTROL_RATIO {
        return Err(InputError::BinaryContent { control_ratio });
    }
    Ok(())
}

/// Fingerprint of a signal's normalized title and body.
///
/// Equivalent to fingerprinting the normalized concatenation
/// `"<title> <body>"`, so where a source splits title and body does not
/// matter.
#[must_use]
pub fn fingerprint(title: &NormalizedText, body: &NormalizedText) -> ContentFingerprint {
    fingerprint_text(&NormalizedText::join(title, body))
}

/// Fingerprint of a single normalized text. The empty text has a stable
/// fingerprint like any other.
#[must_use]
pub fn fingerprint_text(text: &NormalizedText) -> ContentFingerprint {
    ContentFingerprint::digest(text.folded.as_bytes())
}

#[must_use]
pub fn is_duplicate(
    fingerprint: &ContentFingerprint,
    existing: &HashSet<ContentFingerprint>,
) -> bool {
    existing.contains(fingerprint)
}

/// A raw signal with its canonical text and identity attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSignal {
    pub signal_id: String,
    pub raw: RawSignal,
    /// Title and body joined.
    pub text: NormalizedText,
    pub fingerprint: ContentFingerprint,
}

/// Normalize a raw signal's title and body and fingerprint the result.
///
/// # Errors
///
/// Returns [`InputError`] if either field is rejected by [`normalize`].
pub fn normalize_signal(raw: &RawSignal) -> Result<NormalizedSignal, InputError> {
    let title = normalize(&raw.title)?;
    let body = normalize(&raw.body)?;
    let text = NormalizedText::join(&title, &body);
    let fingerprint = fingerprint_text(&text);
    Ok(NormalizedSignal {
        signal_id: raw.signal_id(),
        raw: raw.clone(),
        text,
        fingerprint,
    })
}

/// Record of an already-stored signal, used to seed a [`DedupIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenSignal {
    pub source: String,
    pub external_id: String,
    pub fingerprint: ContentFingerprint,
}

impl From<&NormalizedSignal> for SeenSignal {
    fn from(signal: &NormalizedSignal) -> Self {
        Self {
            source: signal.raw.source.clone(),
            external_id: signal.raw.external_id.clone(),
            fingerprint: signal.fingerprint.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    /// Same source already holds identical normalized content.
    SameContent,
    /// Same source already delivered this external id.
    SameExternalId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// New for its source. Other sources holding identical content are
    /// listed for a downstream policy decision; they are not merged.
    Accepted { cross_source_matches: Vec<String> },
    Duplicate(DuplicateReason),
}

/// Keyed view of what has been ingested so far.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    external_ids: HashSet<(String, String)>,
    by_source: BTreeMap<String, HashSet<ContentFingerprint>>,
    sources_by_fingerprint: BTreeMap<ContentFingerprint, BTreeSet<String>>,
}

impl DedupIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from previously stored signals.
    pub fn from_seen<'a>(seen: impl IntoIterator<Item = &'a SeenSignal>) -> Self {
        let mut index = Self::new();
        for s in seen {
            index.record(&s.source, &s.external_id, &s.fingerprint);
        }
        index
    }

    /// Number of distinct `(source, external_id)` pairs recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.external_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.external_ids.is_empty()
    }

    /// Check a signal against the index and record it when accepted.
    pub fn admit(&mut self, signal: &NormalizedSignal) -> DedupDecision {
        let source = signal.raw.source.as_str();
        let key = (source.to_string(), signal.raw.external_id.clone());
        if self.external_ids.contains(&key) {
            return DedupDecision::Duplicate(DuplicateReason::SameExternalId);
        }
        if self
            .by_source
            .get(source)
            .is_some_and(|existing| is_duplicate(&signal.fingerprint, existing))
        {
            return DedupDecision::Duplicate(DuplicateReason::SameContent);
        }

        let cross_source_matches = self
            .sources_by_fingerprint
            .get(&signal.fingerprint)
            .map(|sources| sources.iter().filter(|s| *s != source).cloned().collect())
            .unwrap_or_default();

        self.record(source, &signal.raw.external_id, &signal.fingerprint);
        DedupDecision::Accepted {
            cross_source_matches,
        }
    }

    fn record(&mut self, source: &str, external_id: &str, fingerprint: &ContentFingerprint) {
        self.external_ids
            .insert((source.to_string(), external_id.to_string()));
        self.by_source
            .entry(source.to_string())
            .or_default()
            .insert(fingerprint.clone());
        self.sources_by_fingerprint
            .entry(fingerprint.clone())
            .or_default()
            .insert(source.to_string());
    }
}
