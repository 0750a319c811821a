use std::path::{Path, PathBuf};
use std::time::Duration;

use cidstore_types::CollectionName;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a SQLite-backed store.
///
/// ```toml
/// path = "data/blocks.db"
/// collection = "keystore"
/// busy_timeout_ms = 5000
/// create_key_index = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Location of the database file. Created on initialization if absent.
    pub path: PathBuf,
    /// Table holding this store's entries.
    pub collection: CollectionName,
    /// How long a statement waits for another writer's lock, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Whether to create the secondary index on the key column.
    #[serde(default = "default_create_key_index")]
    pub create_key_index: bool,
}

/// Largest busy timeout SQLite accepts (`sqlite3_busy_timeout` takes an `int`).
pub const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_create_key_index() -> bool {
    true
}

impl StoreConfig {
    /// Configuration with default tuning for the given file and collection.
    pub fn new(path: impl Into<PathBuf>, collection: &str) -> StoreResult<Self> {
        let collection = CollectionName::new(collection).map_err(StoreError::InvalidCollection)?;
        Ok(Self {
            path: path.into(),
            collection,
            busy_timeout_ms: default_busy_timeout_ms(),
            create_key_index: default_create_key_index(),
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set the busy timeout, saturating at [`MAX_BUSY_TIMEOUT_MS`].
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .min(MAX_BUSY_TIMEOUT_MS);
        self
    }

    /// Check values the type system cannot rule out.
    pub fn validate(&self) -> StoreResult<()> {
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(StoreError::Config(format!(
                "busy_timeout_ms {} exceeds maximum of {MAX_BUSY_TIMEOUT_MS}",
                self.busy_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn with_key_index(mut self, enabled: bool) -> Self {
        self.create_key_index = enabled;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_defaults() {
        let c = StoreConfig::new("test.db", "keystore").unwrap();
        assert_eq!(c.path, PathBuf::from("test.db"));
        assert_eq!(c.collection.as_str(), "keystore");
        assert_eq!(c.busy_timeout(), Duration::from_secs(5));
        assert!(c.create_key_index);
    }

    #[test]
    fn new_rejects_bad_collection() {
        let err = StoreConfig::new("test.db", "drop table").unwrap_err();
        assert!(matches!(err, StoreError::InvalidCollection(_)));
    }

    #[test]
    fn parse_minimal_toml() {
        let c = StoreConfig::from_toml_str("path = \"a.db\"\ncollection = \"blocks\"\n").unwrap();
        assert_eq!(c, StoreConfig::new("a.db", "blocks").unwrap());
    }

    #[test]
    fn parse_full_toml() {
        let c = StoreConfig::from_toml_str(
            r#"
            path = "data/blocks.db"
            collection = "blocks"
            busy_timeout_ms = 250
            create_key_index = false
            "#,
        )
        .unwrap();
        assert_eq!(c.busy_timeout(), Duration::from_millis(250));
        assert!(!c.create_key_index);
    }

    #[test]
    fn toml_with_bad_collection_is_config_error() {
        let err =
            StoreConfig::from_toml_str("path = \"a.db\"\ncollection = \"a;b\"\n").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn toml_with_oversized_busy_timeout_is_config_error() {
        let err = StoreConfig::from_toml_str(
            "path = \"a.db\"\ncollection = \"blocks\"\nbusy_timeout_ms = 3000000000\n",
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn busy_timeout_at_limit_is_accepted() {
        let text = format!(
            "path = \"a.db\"\ncollection = \"blocks\"\nbusy_timeout_ms = {MAX_BUSY_TIMEOUT_MS}\n"
        );
        let c = StoreConfig::from_toml_str(&text).unwrap();
        assert_eq!(c.busy_timeout_ms, MAX_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn with_busy_timeout_saturates() {
        let c = StoreConfig::new("a.db", "k")
            .unwrap()
            .with_busy_timeout(Duration::MAX);
        assert_eq!(c.busy_timeout_ms, MAX_BUSY_TIMEOUT_MS);
        c.validate().unwrap();
    }

    #[test]
    fn validate_rejects_oversized_field() {
        let mut c = StoreConfig::new("a.db", "k").unwrap();
        c.busy_timeout_ms = u64::MAX;
        assert!(matches!(c.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn toml_missing_path_is_config_error() {
        let err = StoreConfig::from_toml_str("collection = \"blocks\"\n").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "path = \"x.db\"\ncollection = \"keystore\"\n").unwrap();
        let c = StoreConfig::load(&path).unwrap();
        assert_eq!(c.collection.as_str(), "keystore");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn builders() {
        let c = StoreConfig::new("a.db", "k")
            .unwrap()
            .with_busy_timeout(Duration::from_millis(10))
            .with_key_index(false);
        assert_eq!(c.busy_timeout_ms, 10);
        assert!(!c.create_key_index);
    }
}
