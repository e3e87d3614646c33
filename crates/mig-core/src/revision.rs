//! Strongly-typed revision identifier.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Length of freshly generated revision ids.
pub const REVISION_ID_LEN: usize = 12;

/// Minimum length of a prefix accepted when resolving a revision.
pub const MIN_PREFIX_LEN: usize = 4;

/// Opaque, non-empty revision token.
///
/// Generated ids are 12 lowercase hex characters. Hand-written ids may use
/// ASCII alphanumerics and `-`; `_` is reserved as the separator between the
/// id and the slug in node file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(String);

impl RevisionId {
    /// Parse and validate a revision token.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvalidRevisionId {
                id,
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(CoreError::InvalidRevisionId {
                reason: format!("contains invalid character '{bad}'"),
                id,
            });
        }
        Ok(Self(id))
    }

    /// Generate a fresh random revision id.
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex[..REVISION_ID_LEN].to_string())
    }

    /// Return the underlying token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `prefix` is a prefix of this id.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RevisionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for RevisionId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RevisionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RevisionId {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for RevisionId {
    type Error = CoreError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<RevisionId> for String {
    fn from(id: RevisionId) -> Self {
        id.0
    }
}

impl PartialEq<str> for RevisionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RevisionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Join revision ids for error messages and status output.
pub fn join_revisions<'a>(ids: impl IntoIterator<Item = &'a RevisionId>) -> String {
    ids.into_iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_short_hex() {
        let id = RevisionId::generate();
        assert_eq!(id.len(), REVISION_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_is_unique() {
        let a = RevisionId::generate();
        let b = RevisionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        assert!(RevisionId::parse("").is_err());
        assert!(RevisionId::parse("abc_def").is_err());
        assert!(RevisionId::parse("abc def").is_err());
        assert!(RevisionId::parse("../etc").is_err());
        assert!(RevisionId::parse("ae1027a6acf").is_ok());
        assert!(RevisionId::parse("release-2").is_ok());
    }

    #[test]
    fn test_serde_validates() {
        let id: RevisionId = serde_yaml::from_str("ae1027a6acf4").unwrap();
        assert_eq!(id, "ae1027a6acf4");
        assert!(serde_yaml::from_str::<RevisionId>("'a b'").is_err());
    }

    #[test]
    fn test_borrow_lookup() {
        use std::collections::HashMap;
        let mut map: HashMap<RevisionId, i32> = HashMap::new();
        map.insert(RevisionId::parse("abcd").unwrap(), 1);
        assert_eq!(map.get("abcd"), Some(&1));
    }

    #[test]
    fn test_join_revisions() {
        let ids = vec![
            RevisionId::parse("aaaa").unwrap(),
            RevisionId::parse("bbbb").unwrap(),
        ];
        assert_eq!(join_revisions(&ids), "aaaa, bbbb");
    }
}
