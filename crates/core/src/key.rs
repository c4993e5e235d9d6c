//! Join key used to correlate recipients with invoice rows.

use serde::{Deserialize, Serialize};

/// Normalized join key (tax ID / RUC in the source domain).
///
/// Keys are trimmed at construction and otherwise preserved verbatim: no case
/// folding and no numeric coercion, so `"0190007510001"` and `"190007510001"`
/// are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct JoinKey(String);

impl JoinKey {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rows whose key is empty cannot take part in a join.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for JoinKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JoinKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JoinKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JoinKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<JoinKey> for String {
    fn from(key: JoinKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_but_preserves_case_and_leading_zeros() {
        let key = JoinKey::new("  0190007510001 ");
        assert_eq!(key.as_str(), "0190007510001");
        assert_ne!(key, JoinKey::new("190007510001"));
        assert_ne!(JoinKey::new("abc"), JoinKey::new("ABC"));
    }

    #[test]
    fn deserialized_keys_are_trimmed() {
        let key: JoinKey = serde_json::from_str("\" 001 \"").unwrap();
        assert_eq!(key.as_str(), "001");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"001\"");
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(JoinKey::new(" \t ").is_empty());
    }
}
