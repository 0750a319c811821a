//! Persistent key-value storage for cidstore.
//!
//! A store maps printable keys to opaque byte values in a single table of a
//! SQLite database. Keys are normally content-addressed (see
//! [`cidstore_types::ContentKey`]), so a key always names the same bytes and
//! a write degenerates to "insert if missing".
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`SqliteStore`] -- one table per collection in a SQLite file
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Entries are immutable once written; the first successful put wins.
//! 2. `put` is one atomic insert-or-ignore statement, never check-then-insert.
//! 3. Reads and existence checks never mutate.
//! 4. Collection names are validated identifiers before they reach any DDL.
//! 5. All storage errors are propagated as typed [`StoreError`]s.
//!
//! # Example
//!
//! ```no_run
//! use cidstore_store::{KeyValueStore, SqliteStore, StoreConfig};
//! use cidstore_types::OpContext;
//!
//! # fn main() -> Result<(), cidstore_store::StoreError> {
//! let store = SqliteStore::initialize(StoreConfig::new("blocks.db", "keystore")?)?;
//! store.open()?;
//!
//! let ctx = OpContext::background();
//! let key = store.put_content(&ctx, b"hello")?;
//! assert!(store.has(&ctx, key.as_str())?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;
