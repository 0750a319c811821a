use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Domain tag mixed into every content digest.
const CONTENT_DOMAIN: &str = "cidstore-content-v1";

/// Printable identifier for a stored value.
///
/// Any non-empty string without control characters is a valid key. Keys
/// produced by [`ContentKey::derive`] are the domain-separated BLAKE3 digest
/// of the value, so identical content always maps to the same key and the
/// store can treat a repeated write as a no-op.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey(String);

impl ContentKey {
    /// Wrap an existing key after validating it.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    /// Derive the content-addressed key for `data`.
    pub fn derive(data: &[u8]) -> Self {
        Self(hex::encode(digest(data)))
    }

    /// Returns `true` if `data` hashes to this key.
    ///
    /// Always `false` for keys that were not produced by [`derive`](Self::derive).
    pub fn verify(&self, data: &[u8]) -> bool {
        self.0 == hex::encode(digest(data))
    }

    /// Returns `true` if the key has the shape of a derived digest.
    pub fn is_digest(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Check that `key` is usable as a store key.
pub fn validate_key(key: &str) -> Result<(), TypeError> {
    if key.is_empty() {
        return Err(TypeError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".into(),
        });
    }
    if let Some(ch) = key.chars().find(|c| c.is_control()) {
        return Err(TypeError::InvalidKey {
            key: key.to_string(),
            reason: format!("contains control character: {ch:?}"),
        });
    }
    Ok(())
}

fn digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(CONTENT_DOMAIN.as_bytes());
    hasher.update(b":");
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.short())
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ContentKey {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.0
    }
}
