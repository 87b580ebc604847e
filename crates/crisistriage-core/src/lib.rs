//! Core domain types for the crisis message triage pipeline.
//!
//! This crate defines the category registry, the label vector attached to
//! every message, the record types exchanged between the ETL, storage and
//! training stages, and the shared error type. It is dependency-light by
//! design so that every other crate in the workspace can build on it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Category registry
// ---------------------------------------------------------------------------

/// Number of annotation categories carried by every message.
pub const CATEGORY_COUNT: usize = 36;

/// Canonical category names, in the column order used by the annotation
/// export, the database table and the trained model.
///
/// The order is load-bearing: label vectors, database columns and per-label
/// metrics all index into this array.
pub const CATEGORY_NAMES: [&str; CATEGORY_COUNT] = [
    "related",
    "request",
    "offer",
    "aid_related",
    "medical_help",
    "medical_products",
    "search_and_rescue",
    "security",
    "military",
    "child_alone",
    "water",
    "food",
    "shelter",
    "clothing",
    "money",
    "missing_people",
    "refugees",
    "death",
    "other_aid",
    "infrastructure_related",
    "transport",
    "buildings",
    "electricity",
    "tools",
    "hospitals",
    "shops",
    "aid_centers",
    "other_infrastructure",
    "weather_related",
    "floods",
    "storm",
    "fire",
    "earthquake",
    "cold",
    "other_weather",
    "direct_report",
];

/// Returns the registry index of a category name, if it is known.
pub fn category_index(name: &str) -> Option<usize> {
    CATEGORY_NAMES.iter().position(|&n| n == name)
}

// ---------------------------------------------------------------------------
// Label vector
// ---------------------------------------------------------------------------

/// Binary label vector over the full category registry.
///
/// One entry per category, in [`CATEGORY_NAMES`] order. Values are 0 or 1
/// after ETL repair; the raw annotation format may carry other digits, which
/// [`CategoryVector::from_str`] preserves so the cleaning stage can count
/// what it fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryVector(pub [u8; CATEGORY_COUNT]);

impl CategoryVector {
    /// A vector with every category switched off.
    pub fn zeros() -> Self {
        CategoryVector([0; CATEGORY_COUNT])
    }

    /// Value for the category at `index`.
    pub fn get(&self, index: usize) -> u8 {
        self.0[index]
    }

    /// Sets the category at `index` to `value`.
    pub fn set(&mut self, index: usize, value: u8) {
        self.0[index] = value;
    }

    /// The underlying values in registry order.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Builds a vector from a slice, which must have exactly
    /// [`CATEGORY_COUNT`] entries.
    pub fn from_slice(values: &[u8]) -> Result<Self> {
        let arr: [u8; CATEGORY_COUNT] = values.try_into().map_err(|_| {
            TriageError::Label(format!(
                "expected {} label values, got {}",
                CATEGORY_COUNT,
                values.len()
            ))
        })?;
        Ok(CategoryVector(arr))
    }

    /// Names of the categories currently switched on.
    pub fn active_names(&self) -> Vec<&'static str> {
        CATEGORY_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, &v)| v != 0)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Clamps every value above 1 down to 1, returning how many entries
    /// were changed.
    pub fn clamp_binary(&mut self) -> usize {
        let mut repaired = 0;
        for v in self.0.iter_mut() {
            if *v > 1 {
                *v = 1;
                repaired += 1;
            }
        }
        repaired
    }
}

impl fmt::Display for CategoryVector {
    /// Formats the vector in the raw annotation encoding,
    /// e.g. `related-1;request-0;...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in CATEGORY_NAMES.iter().zip(self.0.iter()).enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{name}-{value}")?;
        }
        Ok(())
    }
}

impl FromStr for CategoryVector {
    type Err = TriageError;

    /// Parses the raw annotation encoding: 36 semicolon-separated tokens,
    /// each a registry name followed by a dash and a single digit, in
    /// registry order. Digits other than 0 and 1 are kept as-is so the
    /// caller can repair and count them.
    fn from_str(s: &str) -> Result<Self> {
        let mut values = [0u8; CATEGORY_COUNT];
        let mut count = 0;
        for (i, token) in s.split(';').enumerate() {
            if i >= CATEGORY_COUNT {
                return Err(TriageError::Label(format!(
                    "expected {CATEGORY_COUNT} category tokens, got more"
                )));
            }
            let token = token.trim();
            let (name, digit) = split_token(token)?;
            if name != CATEGORY_NAMES[i] {
                return Err(TriageError::Label(format!(
                    "category {} out of order: expected '{}', got '{}'",
                    i, CATEGORY_NAMES[i], name
                )));
            }
            values[i] = digit;
            count += 1;
        }
        if count != CATEGORY_COUNT {
            return Err(TriageError::Label(format!(
                "expected {CATEGORY_COUNT} category tokens, got {count}"
            )));
        }
        Ok(CategoryVector(values))
    }
}

/// Splits an annotation token like `water-1` into its name and digit.
fn split_token(token: &str) -> Result<(&str, u8)> {
    let bytes = token.as_bytes();
    if bytes.len() < 3 {
        return Err(TriageError::Label(format!(
            "malformed category token '{token}'"
        )));
    }
    let digit = bytes[bytes.len() - 1];
    let dash = bytes[bytes.len() - 2];
    if dash != b'-' || !digit.is_ascii_digit() {
        return Err(TriageError::Label(format!(
            "malformed category token '{token}': expected '<name>-<digit>'"
        )));
    }
    Ok((&token[..token.len() - 2], digit - b'0'))
}

impl Serialize for CategoryVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for CategoryVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let values = Vec::<u8>::deserialize(deserializer)?;
        CategoryVector::from_slice(&values).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One row of the raw messages export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Stable identifier shared with the annotation export.
    pub id: i64,
    /// English rendering of the message; the text the classifier trains on.
    pub message: String,
    /// Source-language text, when it differs from `message`.
    pub original: Option<String>,
    /// Channel the message arrived through (`direct`, `news`, `social`).
    pub genre: String,
}

/// One row of the raw annotation export: the message id plus the encoded
/// category string, e.g. `related-1;request-0;...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub categories: String,
}

/// A message joined with its cleaned binary labels. This is the unit the
/// storage layer persists and the training stage consumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledMessage {
    pub id: i64,
    pub message: String,
    pub original: Option<String>,
    pub genre: String,
    pub labels: CategoryVector,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors shared across the triage pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TriageError {
    /// CSV ingest failures: unreadable files, malformed rows.
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Annotation label failures: unknown names, bad encodings.
    #[error("Label error: {0}")]
    Label(String),

    /// Database failures.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Training failures: degenerate data, invalid hyperparameters.
    #[error("Training error: {0}")]
    Training(String),

    /// Model artifact failures: version mismatches, unreadable files.
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid pipeline configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failures.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias used across the workspace.
pub type Result<T> = std::result::Result<T, TriageError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_encoding(values: &[u8; CATEGORY_COUNT]) -> String {
        CATEGORY_NAMES
            .iter()
            .zip(values.iter())
            .map(|(name, v)| format!("{name}-{v}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    #[test]
    fn test_registry_is_complete() {
        assert_eq!(CATEGORY_NAMES.len(), CATEGORY_COUNT);
        assert_eq!(category_index("related"), Some(0));
        assert_eq!(category_index("water"), Some(10));
        assert_eq!(category_index("direct_report"), Some(CATEGORY_COUNT - 1));
        assert_eq!(category_index("not_a_category"), None);
    }

    #[test]
    fn test_registry_names_are_unique() {
        for (i, name) in CATEGORY_NAMES.iter().enumerate() {
            assert_eq!(category_index(name), Some(i));
        }
    }

    #[test]
    fn test_parse_raw_encoding() {
        let mut values = [0u8; CATEGORY_COUNT];
        values[0] = 1;
        values[10] = 1;
        let parsed: CategoryVector = raw_encoding(&values).parse().unwrap();
        assert_eq!(parsed.get(0), 1);
        assert_eq!(parsed.get(1), 0);
        assert_eq!(parsed.get(10), 1);
        assert_eq!(parsed.active_names(), vec!["related", "water"]);
    }

    #[test]
    fn test_parse_keeps_out_of_range_digits() {
        let mut values = [0u8; CATEGORY_COUNT];
        values[0] = 2;
        let mut parsed: CategoryVector = raw_encoding(&values).parse().unwrap();
        assert_eq!(parsed.get(0), 2);
        assert_eq!(parsed.clamp_binary(), 1);
        assert_eq!(parsed.get(0), 1);
        assert_eq!(parsed.clamp_binary(), 0);
    }

    #[test]
    fn test_parse_rejects_wrong_token_count() {
        let err = "related-1;request-0".parse::<CategoryVector>().unwrap_err();
        assert!(matches!(err, TriageError::Label(_)));
    }

    #[test]
    fn test_parse_rejects_out_of_order_names() {
        let values = [0u8; CATEGORY_COUNT];
        let encoded = raw_encoding(&values).replacen("related", "request", 1);
        let err = encoded.parse::<CategoryVector>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("out of order"), "unexpected error: {msg}");
    }

    #[test]
    fn test_parse_rejects_malformed_token() {
        let values = [0u8; CATEGORY_COUNT];
        let encoded = raw_encoding(&values).replacen("related-0", "related_0", 1);
        assert!(encoded.parse::<CategoryVector>().is_err());

        let encoded = raw_encoding(&values).replacen("related-0", "related-x", 1);
        assert!(encoded.parse::<CategoryVector>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let mut vector = CategoryVector::zeros();
        vector.set(3, 1);
        vector.set(35, 1);
        let rendered = vector.to_string();
        let parsed: CategoryVector = rendered.parse().unwrap();
        assert_eq!(parsed, vector);
    }

    #[test]
    fn test_from_slice_checks_length() {
        assert!(CategoryVector::from_slice(&[0u8; CATEGORY_COUNT]).is_ok());
        assert!(CategoryVector::from_slice(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut vector = CategoryVector::zeros();
        vector.set(0, 1);
        vector.set(11, 1);
        let json = serde_json::to_string(&vector).unwrap();
        let back: CategoryVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vector);

        let record = LabeledMessage {
            id: 7,
            message: "we need water".into(),
            original: None,
            genre: "direct".into(),
            labels: vector,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: LabeledMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
