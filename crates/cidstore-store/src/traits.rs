use cidstore_types::{ContentKey, OpContext};

use crate::error::{StoreError, StoreResult};

/// Persistent key-value store with write-once semantics.
///
/// All implementations must satisfy these invariants:
/// - A key, once written, keeps the bytes of its first successful `put`.
///   Later puts for the same key succeed without touching storage.
/// - `put` is a single atomic insert-or-ignore, so concurrent first writers
///   of the same key all succeed.
/// - Values are returned byte-for-byte, including empty values and NUL bytes.
/// - An absent key is `Ok(false)` from `has` and `StoreError::NotFound` from
///   `get`, never an I/O error.
/// - The context is checked before a statement is issued and never
///   interrupts one in flight.
pub trait KeyValueStore: Send + Sync {
    /// Check whether `key` is present without reading its value.
    fn has(&self, ctx: &OpContext, key: &str) -> StoreResult<bool>;

    /// Read the value stored under `key`.
    ///
    /// Returns `Err(StoreError::NotFound)` if the key does not exist.
    fn get(&self, ctx: &OpContext, key: &str) -> StoreResult<Vec<u8>>;

    /// Store `value` under `key` unless the key already exists.
    fn put(&self, ctx: &OpContext, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Store `data` under its content-addressed key and return that key.
    fn put_content(&self, ctx: &OpContext, data: &[u8]) -> StoreResult<ContentKey> {
        let key = ContentKey::derive(data);
        self.put(ctx, key.as_str(), data)?;
        Ok(key)
    }

    /// Read the value under a content-addressed key and check its digest.
    fn get_verified(&self, ctx: &OpContext, key: &ContentKey) -> StoreResult<Vec<u8>> {
        let data = self.get(ctx, key.as_str())?;
        if !key.verify(&data) {
            return Err(StoreError::HashMismatch {
                key: key.to_string(),
                computed: ContentKey::derive(&data).to_string(),
            });
        }
        Ok(data)
    }

    /// Check several keys. Default implementation calls `has()` for each.
    fn has_batch(&self, ctx: &OpContext, keys: &[&str]) -> StoreResult<Vec<bool>> {
        keys.iter().map(|key| self.has(ctx, key)).collect()
    }

    /// Read several keys; missing keys yield `None`.
    ///
    /// Default implementation calls `get()` for each key. Backends may
    /// override for fewer round-trips.
    fn get_batch(&self, ctx: &OpContext, keys: &[&str]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        keys.iter()
            .map(|key| match self.get(ctx, key) {
                Ok(value) => Ok(Some(value)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            })
            .collect()
    }

    /// Store several entries. Default implementation calls `put()` for each,
    /// stopping at the first error; earlier entries stay written.
    fn put_batch(&self, ctx: &OpContext, entries: &[(&str, &[u8])]) -> StoreResult<()> {
        entries
            .iter()
            .try_for_each(|(key, value)| self.put(ctx, key, value))
    }
}
