use std::collections::HashMap;
use std::sync::RwLock;

use cidstore_types::key::validate_key;
use cidstore_types::OpContext;

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// In-memory, HashMap-based key-value store.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`
/// and follow the same write-once rules as the SQLite backend.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Total value bytes across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }

    /// Return a sorted list of all keys in the store.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    fn has(&self, ctx: &OpContext, key: &str) -> StoreResult<bool> {
        validate_key(key).map_err(StoreError::InvalidKey)?;
        ctx.check()?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn get(&self, ctx: &OpContext, key: &str) -> StoreResult<Vec<u8>> {
        validate_key(key).map_err(StoreError::InvalidKey)?;
        ctx.check()?;
        let map = self.entries.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, ctx: &OpContext, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key).map_err(StoreError::InvalidKey)?;
        ctx.check()?;
        let mut map = self.entries.write().expect("lock poisoned");
        // First write wins.
        map.entry(key.to_string()).or_insert_with(|| value.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryStore")
            .field("entry_count", &count)
            .finish()
    }
}
