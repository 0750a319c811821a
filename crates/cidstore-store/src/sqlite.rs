use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use cidstore_types::key::validate_key;
use cidstore_types::{CollectionName, OpContext};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// Statements for one collection, built once from the validated name.
struct Statements {
    create_table: String,
    create_index: String,
    has: String,
    get: String,
    put: String,
}

impl Statements {
    fn for_collection(collection: &CollectionName) -> Self {
        let table = collection.quoted();
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (key TEXT NOT NULL PRIMARY KEY, value BLOB)"
            ),
            create_index: format!(
                "CREATE INDEX IF NOT EXISTS \"{}\" ON {table} (key)",
                collection.key_index_name()
            ),
            has: format!("SELECT 1 FROM {table} WHERE key = ?1"),
            get: format!("SELECT value FROM {table} WHERE key = ?1"),
            put: format!(
                "INSERT INTO {table} (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO NOTHING"
            ),
        }
    }
}

/// Key-value store backed by a single SQLite table.
///
/// Lifecycle: [`initialize`](Self::initialize) makes sure the database file
/// exists, [`open`](Self::open) connects and creates the table and index.
/// Operations on a store that was never opened fail with
/// [`StoreError::NotOpen`]. The connection is released on drop or by
/// [`close`](Self::close).
///
/// One handle owns one connection behind a mutex, so a handle can be shared
/// across threads through `Arc`; its statements run one at a time. Separate
/// handles on the same file coordinate through SQLite's file locks and the
/// configured busy timeout.
pub struct SqliteStore {
    config: StoreConfig,
    sql: Statements,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Record the location and collection, creating an empty database file
    /// (and its parent directories) if none exists. Does not connect.
    pub fn initialize(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        create_if_missing(&config.path).map_err(|source| StoreError::Initialization {
            path: config.path.clone(),
            source,
        })?;

        let sql = Statements::for_collection(&config.collection);
        Ok(Self {
            config,
            sql,
            conn: Mutex::new(None),
        })
    }

    /// [`initialize`](Self::initialize) followed by [`open`](Self::open).
    pub fn connect(config: StoreConfig) -> StoreResult<Self> {
        let store = Self::initialize(config)?;
        store.open()?;
        Ok(store)
    }

    /// Connect to the database file and ensure the table and key index exist.
    ///
    /// Calling `open` on an already open store is a no-op.
    pub fn open(&self) -> StoreResult<()> {
        let mut guard = self.conn.lock().expect("connection mutex poisoned");
        if guard.is_some() {
            debug!(collection = %self.config.collection, "store already open");
            return Ok(());
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.config.path, flags)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        conn.busy_timeout(self.config.busy_timeout())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.execute(&self.sql.create_table, [])?;
        if self.config.create_key_index {
            conn.execute(&self.sql.create_index, [])?;
        }

        *guard = Some(conn);
        info!(
            path = %self.config.path.display(),
            collection = %self.config.collection,
            "store opened"
        );
        Ok(())
    }

    /// Returns `true` once [`open`](Self::open) has succeeded.
    pub fn is_open(&self) -> bool {
        self.conn.lock().expect("connection mutex poisoned").is_some()
    }

    /// Release the connection, reporting any error SQLite raises while
    /// finalizing it.
    pub fn close(self) -> StoreResult<()> {
        let conn = self.conn.into_inner().expect("connection mutex poisoned");
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| StoreError::from(e))?;
            debug!(collection = %self.config.collection, "store closed");
        }
        Ok(())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn collection(&self) -> &CollectionName {
        &self.config.collection
    }

    /// Run `f` against the live connection once the context allows it.
    fn with_conn<T>(
        &self,
        ctx: &OpContext,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let guard = self.conn.lock().expect("connection mutex poisoned");
        ctx.check()?;
        let conn = guard.as_ref().ok_or(StoreError::NotOpen)?;
        Ok(f(conn)?)
    }
}

fn create_if_missing(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().write(true).create(true).open(path)?;
    info!(path = %path.display(), "created store file");
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn has(&self, ctx: &OpContext, key: &str) -> StoreResult<bool> {
        validate_key(key).map_err(StoreError::InvalidKey)?;
        self.with_conn(ctx, |conn| {
            conn.prepare_cached(&self.sql.has)?
                .query_row(params![key], |_| Ok(()))
                .optional()
                .map(|row| row.is_some())
        })
    }

    fn get(&self, ctx: &OpContext, key: &str) -> StoreResult<Vec<u8>> {
        validate_key(key).map_err(StoreError::InvalidKey)?;
        let value = self.with_conn(ctx, |conn| {
            conn.prepare_cached(&self.sql.get)?
                .query_row(params![key], |row| row.get::<_, Option<Vec<u8>>>(0))
                .optional()
        })?;
        match value {
            Some(Some(bytes)) => Ok(bytes),
            Some(None) => {
                warn!(
                    key,
                    collection = %self.config.collection,
                    "stored value is NULL; returning empty value"
                );
                Ok(Vec::new())
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    fn put(&self, ctx: &OpContext, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key).map_err(StoreError::InvalidKey)?;
        let inserted = self.with_conn(ctx, |conn| {
            conn.prepare_cached(&self.sql.put)?
                .execute(params![key, value])
        })?;
        debug!(key, len = value.len(), inserted = inserted == 1, "put");
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.config.path)
            .field("collection", &self.config.collection)
            .field("open", &self.is_open())
            .finish()
    }
}
