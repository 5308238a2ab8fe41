use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A post or thread as handed over by a source adapter.
///
/// Adapters own fetching and pagination; the pipeline only relies on a
/// stable `external_id` per `source` and, when known, the creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSignal {
    /// Identifier assigned by the source, unique within that source.
    pub external_id: String,
    /// Source slug, e.g. `"reddit"` or `"hackernews"`.
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Upvotes plus comments, or whatever the source counts as attention.
    #[serde(default)]
    pub engagement: u64,
}

impl RawSignal {
    /// Stable identity used to key pain instances: `"<source>:<external_id>"`.
    #[must_use]
    pub fn signal_id(&self) -> String {
        format!("{}:{}", self.source, self.external_id)
    }
}

/// Lower-case hex SHA-256 digest of a signal's normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Hex length of a 256-bit digest.
    pub const HEX_LEN: usize = 64;

    /// Parses a previously stored fingerprint.
    ///
    /// Returns `None` unless the input is exactly 64 hex characters.
    /// Upper-case digits are folded to lower case.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        if hex.len() != Self::HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(hex.to_ascii_lowercase()))
    }

    /// SHA-256 of `bytes`.
    #[must_use]
    pub fn digest(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_id_joins_source_and_external_id() {
        let signal = RawSignal {
            external_id: "t3_abc".to_string(),
            source: "reddit".to_string(),
            title: "Invoices are a mess".to_string(),
            body: String::new(),
            url: None,
            created_at: None,
            engagement: 0,
        };
        assert_eq!(signal.signal_id(), "reddit:t3_abc");
    }

    #[test]
    fn digest_is_lower_hex_sha256() {
        let fp = ContentFingerprint::digest(b"abc");
        assert_eq!(fp.as_str().len(), ContentFingerprint::HEX_LEN);
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(ContentFingerprint::from_hex(fp.as_str()), Some(fp));
    }

    #[test]
    fn from_hex_accepts_digest_and_folds_case() {
        let upper = "AB".repeat(32);
        let fp = ContentFingerprint::from_hex(&upper).expect("valid hex");
        assert_eq!(fp.as_str(), "ab".repeat(32));
    }

    #[test]
    fn from_hex_rejects_wrong_length_or_alphabet() {
        assert!(ContentFingerprint::from_hex("abc").is_none());
        assert!(ContentFingerprint::from_hex(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn raw_signal_deserializes_with_optional_fields_missing() {
        let json = r#"{"external_id":"1","source":"hn","title":"Why is billing so hard?"}"#;
        let signal: RawSignal = serde_json::from_str(json).unwrap();
        assert!(signal.body.is_empty());
        assert!(signal.url.is_none());
        assert!(signal.created_at.is_none());
    }
}
