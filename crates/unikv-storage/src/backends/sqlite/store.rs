//! The SQLite-backed `RowStore`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tempfile::TempDir;
use tracing::debug;

use crate::backends::emulated::RowStore;
use crate::engine::{
    Durability, EngineError, EngineResult, EngineStats, ErrorContext, KeyRange, Operation, Order,
};

use super::{SqliteConfig, SqliteRows};

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS kv (key BLOB NOT NULL PRIMARY KEY, value BLOB NOT NULL) WITHOUT ROWID";
const SELECT_VALUE: &str = "SELECT value FROM kv WHERE key = ?1";
const UPSERT: &str = "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)";
const DELETE: &str = "DELETE FROM kv WHERE key = ?1";

const SYNCHRONOUS_NORMAL: i32 = 1;
const SYNCHRONOUS_FULL: i32 = 2;

/// A connection plus the `synchronous` level it is currently set to.
struct Handle {
    conn: Connection,
    durability: Option<Durability>,
}

impl Handle {
    /// Switch `PRAGMA synchronous` to match `durability`.
    ///
    /// `FULL` syncs the WAL on every commit; `NORMAL` leaves syncing to
    /// checkpoints, so a commit may be lost on power failure but never torn.
    fn set_durability(&mut self, durability: Durability) -> rusqlite::Result<()> {
        if self.durability != Some(durability) {
            let level: i32 = if durability.is_durable() { SYNCHRONOUS_FULL } else { SYNCHRONOUS_NORMAL };
            self.conn.pragma_update(None, "synchronous", level)?;
            self.durability = Some(durability);
        }
        Ok(())
    }
}

/// A read transaction on its own connection.
///
/// The first read inside the transaction pins a WAL snapshot, and every page
/// fetched through it sees the database as of that moment. The transaction
/// is rolled back when the last clone of the owning `Arc` is dropped.
pub struct SqliteSnapshot {
    conn: Mutex<Connection>,
}

impl SqliteSnapshot {
    fn begin(path: &Path, config: &SqliteConfig) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update(None, "query_only", true)?;
        conn.execute_batch("BEGIN DEFERRED")?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Run `f` inside the snapshot's transaction.
    pub(super) fn run<T>(
        &self,
        context: ErrorContext,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> EngineResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| EngineError::backend(context.clone(), "sqlite snapshot lock poisoned"))?;
        f(&conn).map_err(|e| EngineError::backend(context, e))
    }
}

/// A [`RowStore`] over a SQLite database in WAL mode.
///
/// Point reads and writes share one connection guarded by a mutex; SQLite
/// serializes writers anyway. Range queries read through a
/// [`SqliteSnapshot`] on a separate connection, so a long scan neither
/// blocks writers nor observes their commits.
pub struct SqliteStore {
    handle: Mutex<Handle>,
    config: SqliteConfig,
    path: PathBuf,
    // Dropped after the connection so the files outlive it.
    _scratch: Option<TempDir>,
}

impl SqliteStore {
    /// Open or create a database file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>, config: SqliteConfig) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| EngineError::Open(e.to_string()))?;
        debug!("opened sqlite store at {}", path.display());
        Self::initialize(conn, config, path, None)
    }

    /// Create a private database in a temporary directory.
    ///
    /// The directory and its files are removed when the store is dropped.
    /// A file is used rather than `:memory:` because snapshots need a second
    /// connection to the same WAL database.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] if the database cannot be created.
    pub fn temporary(config: SqliteConfig) -> EngineResult<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("unikv-sqlite-")
            .tempdir()
            .map_err(|e| EngineError::Open(e.to_string()))?;
        let path = scratch.path().join("store.sqlite");
        let conn = Connection::open(&path).map_err(|e| EngineError::Open(e.to_string()))?;
        Self::initialize(conn, config, path, Some(scratch))
    }

    /// The configuration the store was opened with.
    pub const fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn initialize(
        conn: Connection,
        config: SqliteConfig,
        path: PathBuf,
        scratch: Option<TempDir>,
    ) -> EngineResult<Self> {
        let open_err = |e: rusqlite::Error| EngineError::Open(e.to_string());

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(open_err)?;
        let journal_mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(open_err)?;
        conn.execute_batch(CREATE_TABLE).map_err(open_err)?;
        debug!(journal_mode = %journal_mode, "sqlite schema ready");

        Ok(Self {
            handle: Mutex::new(Handle { conn, durability: None }),
            config,
            path,
            _scratch: scratch,
        })
    }

    fn lock(&self, context: &ErrorContext) -> EngineResult<MutexGuard<'_, Handle>> {
        self.handle
            .lock()
            .map_err(|_| EngineError::backend(context.clone(), "sqlite connection lock poisoned"))
    }

    /// Run `f` against the connection.
    fn run<T>(
        &self,
        context: ErrorContext,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> EngineResult<T> {
        let mut handle = self.lock(&context)?;
        f(&mut handle.conn).map_err(|e| EngineError::backend(context, e))
    }

    /// Run a write against the connection at the given durability.
    fn run_write<T>(
        &self,
        context: ErrorContext,
        durability: Durability,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> EngineResult<T> {
        let mut handle = self.lock(&context)?;
        let handle = &mut *handle;
        handle
            .set_durability(durability)
            .and_then(|()| f(&mut handle.conn))
            .map_err(|e| EngineError::backend(context, e))
    }
}

impl RowStore for SqliteStore {
    type Snapshot<'a> = Arc<SqliteSnapshot>;
    type Rows<'a> = SqliteRows<'a>;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn select(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.run(ErrorContext::new("get").with_key(key), |conn| {
            conn.prepare_cached(SELECT_VALUE)?.query_row([key], |row| row.get(0)).optional()
        })
    }

    fn upsert(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()> {
        self.run_write(ErrorContext::new("put").with_key(key), durability, |conn| {
            conn.prepare_cached(UPSERT)?.execute(params![key, value]).map(|_| ())
        })
    }

    fn remove(&self, key: &[u8], durability: Durability) -> EngineResult<()> {
        self.run_write(ErrorContext::new("delete").with_key(key), durability, |conn| {
            conn.prepare_cached(DELETE)?.execute([key]).map(|_| ())
        })
    }

    fn snapshot(&self) -> EngineResult<Self::Snapshot<'_>> {
        SqliteSnapshot::begin(&self.path, &self.config)
            .map(Arc::new)
            .map_err(|e| EngineError::backend(ErrorContext::new("snapshot"), e))
    }

    fn query<'a>(
        &'a self,
        snapshot: &Self::Snapshot<'a>,
        range: &KeyRange,
        order: Order,
    ) -> EngineResult<Self::Rows<'a>> {
        Ok(SqliteRows::new(self, Arc::clone(snapshot), range.clone(), order))
    }

    fn supports_descending(&self) -> bool {
        self.config.descending_queries
    }

    fn apply(&self, operations: &[Operation], durability: Durability) -> EngineResult<()> {
        self.run_write(ErrorContext::new("apply"), durability, |conn| {
            let tx = conn.transaction()?;
            {
                let mut upsert = tx.prepare_cached(UPSERT)?;
                let mut delete = tx.prepare_cached(DELETE)?;
                for operation in operations {
                    match operation {
                        Operation::Set { key, value } => upsert.execute(params![key, value])?,
                        Operation::Delete { key } => delete.execute([key])?,
                    };
                }
            }
            tx.commit()
        })
    }

    fn stats(&self) -> EngineResult<EngineStats> {
        self.run(ErrorContext::new("stats"), |conn| {
            let mut out = EngineStats::new();
            for pragma in ["page_count", "page_size", "freelist_count"] {
                let value: i64 = conn.pragma_query_value(None, pragma, |row| row.get(0))?;
                out.insert(pragma.to_string(), value.to_string());
            }
            let journal_mode: String =
                conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
            out.insert("journal_mode".to_string(), journal_mode);
            let entries: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
            out.insert("entries".to_string(), entries.to_string());
            Ok(out)
        })
    }

    fn compact(&self) -> EngineResult<()> {
        self.run(ErrorContext::new("compact"), |conn| conn.execute_batch("VACUUM"))
    }

    fn flush(&self) -> EngineResult<()> {
        self.run(ErrorContext::new("flush"), |conn| {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
        })
    }
}
