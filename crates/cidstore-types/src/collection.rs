//! Collection (table) name validation.
//!
//! Collection names are spliced into schema statements, which cannot take
//! bound parameters, so they are restricted to plain SQL identifiers:
//! - Must be 1 to 63 characters long
//! - Must start with an ASCII letter or `_`
//! - Remaining characters must be ASCII letters, digits, or `_`
//! - Must not start with the reserved `sqlite_` prefix (case-insensitive)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum identifier length. Leaves room for the `_key_index` suffix.
pub const MAX_COLLECTION_NAME_LEN: usize = 63;

const RESERVED_PREFIX: &str = "sqlite_";

/// A validated collection name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_collection_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the secondary index on the key column.
    pub fn key_index_name(&self) -> String {
        format!("{}_key_index", self.0)
    }

    /// The name as a double-quoted SQL identifier.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

/// Validate a collection name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use cidstore_types::collection::validate_collection_name;
///
/// assert!(validate_collection_name("keystore").is_ok());
/// assert!(validate_collection_name("_blocks_v2").is_ok());
/// assert!(validate_collection_name("").is_err());
/// assert!(validate_collection_name("t; DROP TABLE t").is_err());
/// ```
pub fn validate_collection_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidCollectionName {
        name: name.to_string(),
        reason,
    };

    let Some(first) = name.chars().next() else {
        return Err(invalid("collection name must not be empty".into()));
    };

    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(invalid(format!(
            "longer than {MAX_COLLECTION_NAME_LEN} characters"
        )));
    }

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(invalid(format!("must start with a letter or '_', got {first:?}")));
    }

    if let Some(ch) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }

    if name
        .get(..RESERVED_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(RESERVED_PREFIX))
    {
        return Err(invalid("the 'sqlite_' prefix is reserved".into()));
    }

    Ok(())
}

impl fmt::Debug for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionName({})", self.0)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CollectionName {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_names() {
        for name in ["keystore", "KeyStore", "_private", "blocks_v2", "a"] {
            assert!(validate_collection_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn empty_rejected() {
        assert!(validate_collection_name("").is_err());
    }

    #[test]
    fn leading_digit_rejected() {
        assert!(validate_collection_name("2fast").is_err());
    }

    #[test]
    fn injection_rejected() {
        assert!(validate_collection_name("t (key TEXT); DROP TABLE x; --").is_err());
        assert!(validate_collection_name("a\"b").is_err());
        assert!(validate_collection_name("a-b").is_err());
        assert!(validate_collection_name("a b").is_err());
    }

    #[test]
    fn reserved_prefix_rejected() {
        assert!(validate_collection_name("sqlite_master").is_err());
        assert!(validate_collection_name("SQLITE_custom").is_err());
        assert!(validate_collection_name("sqlitex").is_ok());
    }

    #[test]
    fn length_limit() {
        let max = "a".repeat(MAX_COLLECTION_NAME_LEN);
        assert!(validate_collection_name(&max).is_ok());
        let too_long = "a".repeat(MAX_COLLECTION_NAME_LEN + 1);
        assert!(validate_collection_name(&too_long).is_err());
    }

    #[test]
    fn non_ascii_rejected() {
        assert!(validate_collection_name("tablé").is_err());
    }

    #[test]
    fn index_and_quoted_forms() {
        let name = CollectionName::new("keystore").unwrap();
        assert_eq!(name.key_index_name(), "keystore_key_index");
        assert_eq!(name.quoted(), "\"keystore\"");
    }

    #[test]
    fn error_carries_name_and_reason() {
        let err = CollectionName::new("bad-name").unwrap_err();
        match err {
            TypeError::InvalidCollectionName { name, reason } => {
                assert_eq!(name, "bad-name");
                assert!(reason.contains('-'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn identifier_pattern_accepted(name in "[a-rt-zA-RT-Z_][a-zA-Z0-9_]{0,40}") {
            prop_assert!(validate_collection_name(&name).is_ok());
        }

        #[test]
        fn names_with_quotes_never_accepted(prefix in "[a-z]{1,8}", suffix in "[a-z]{0,8}") {
            let name = format!("{prefix}\"{suffix}");
            prop_assert!(validate_collection_name(&name).is_err());
        }
    }
}
