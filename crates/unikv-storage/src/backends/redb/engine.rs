//! Redb storage engine implementation.
//!
//! This module provides the `RedbEngine` type which implements the
//! `KvEngine` trait using the Redb embedded database.

use std::path::Path;

use redb::{Database, Table, WriteTransaction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{
    Capabilities, Direction, Durability, EngineError, EngineResult, EngineStats, ErrorContext,
    KeyRange, KvEngine, WriteGroup,
};

use super::cursor::RedbCursor;
use super::tables::DATA_TABLE;

/// Configuration options for the Redb storage engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedbConfig {
    /// Cache size in bytes.
    /// If not set, uses Redb's default.
    pub cache_size: Option<usize>,
}

impl RedbConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }
}

/// A storage engine backed by Redb.
///
/// Redb range scans are double-ended and start at any key, which makes this
/// the native ordered adapter: seeks and steps in both directions are direct
/// B-tree lookups.
pub struct RedbEngine {
    /// The underlying Redb database.
    db: Database,
}

impl RedbEngine {
    /// Open or create a database at the given path with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        Self::open_with_config(path, RedbConfig::default())
    }

    /// Open or create a database at the given path with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] if the database cannot be opened or created.
    pub fn open_with_config(path: impl AsRef<Path>, config: RedbConfig) -> EngineResult<Self> {
        let mut builder = Database::builder();

        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        let db = builder.create(path.as_ref()).map_err(|e| EngineError::Open(e.to_string()))?;
        debug!("opened redb engine at {}", path.as_ref().display());

        Self::initialize(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// The database will be lost when the engine is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] if the database cannot be created.
    pub fn in_memory() -> EngineResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| EngineError::Open(e.to_string()))?;

        Self::initialize(db)
    }

    /// Create the data table so read transactions never see it missing.
    fn initialize(db: Database) -> EngineResult<Self> {
        let tx = db.begin_write().map_err(|e| EngineError::Open(e.to_string()))?;
        tx.open_table(DATA_TABLE).map_err(|e| EngineError::Open(e.to_string()))?;
        tx.commit().map_err(|e| EngineError::Open(e.to_string()))?;

        Ok(Self { db })
    }

    /// Run a single-operation write transaction.
    fn write<F>(&self, context: ErrorContext, durability: Durability, apply: F) -> EngineResult<()>
    where
        F: FnOnce(&mut Table<'_, &'static [u8], &'static [u8]>) -> Result<(), redb::StorageError>,
    {
        let mut tx = begin_write(&self.db, &context)?;
        tx.set_durability(to_redb_durability(durability));
        {
            let mut table =
                tx.open_table(DATA_TABLE).map_err(|e| EngineError::backend(context.clone(), e))?;
            apply(&mut table).map_err(|e| EngineError::backend(context.clone(), e))?;
        }
        tx.commit().map_err(|e| EngineError::backend(context, e))
    }
}

impl KvEngine for RedbEngine {
    type Cursor<'a> = RedbCursor;
    type WriteGroup<'a> = RedbWriteGroup;

    fn name(&self) -> &'static str {
        "redb"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NATIVE
    }

    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let context = || ErrorContext::new("get").with_key(key);
        let tx = self.db.begin_read().map_err(|e| EngineError::backend(context(), e.to_string()))?;
        let table = tx.open_table(DATA_TABLE).map_err(|e| EngineError::backend(context(), e))?;
        let value = table.get(key).map_err(|e| EngineError::backend(context(), e))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()> {
        self.write(ErrorContext::new("put").with_key(key), durability, |table| {
            table.insert(key, value).map(|_| ())
        })
    }

    fn delete(&self, key: &[u8], durability: Durability) -> EngineResult<()> {
        self.write(ErrorContext::new("delete").with_key(key), durability, |table| {
            table.remove(key).map(|_| ())
        })
    }

    fn cursor(&self, range: &KeyRange, direction: Direction) -> EngineResult<Self::Cursor<'_>> {
        let context = || ErrorContext::new("cursor");
        let tx = self.db.begin_read().map_err(|e| EngineError::backend(context(), e.to_string()))?;
        let table = tx.open_table(DATA_TABLE).map_err(|e| EngineError::backend(context(), e))?;
        Ok(RedbCursor::new(table, range.clone(), direction))
    }

    fn begin_write_group(&self) -> EngineResult<Self::WriteGroup<'_>> {
        let tx = begin_write(&self.db, &ErrorContext::new("begin_write_group"))?;
        Ok(RedbWriteGroup { tx })
    }

    fn stats(&self) -> EngineResult<EngineStats> {
        let context = ErrorContext::new("stats");
        let tx = begin_write(&self.db, &context)?;
        let stats = tx.stats().map_err(|e| EngineError::backend(context.clone(), e))?;
        tx.abort().map_err(|e| EngineError::backend(context, e))?;

        let mut out = EngineStats::new();
        out.insert("tree_height".to_string(), stats.tree_height().to_string());
        out.insert("allocated_pages".to_string(), stats.allocated_pages().to_string());
        out.insert("leaf_pages".to_string(), stats.leaf_pages().to_string());
        out.insert("branch_pages".to_string(), stats.branch_pages().to_string());
        out.insert("stored_bytes".to_string(), stats.stored_bytes().to_string());
        out.insert("metadata_bytes".to_string(), stats.metadata_bytes().to_string());
        out.insert("fragmented_bytes".to_string(), stats.fragmented_bytes().to_string());
        out.insert("page_size".to_string(), stats.page_size().to_string());
        Ok(out)
    }

    // Redb reclaims pages as part of each commit. Whole-file compaction needs
    // exclusive access to the database, which a shared engine cannot offer.
    fn compact(&self, _range: &KeyRange) -> EngineResult<()> {
        Ok(())
    }
}

/// A Redb write transaction used as the engine's atomic write group.
pub struct RedbWriteGroup {
    tx: WriteTransaction,
}

impl WriteGroup for RedbWriteGroup {
    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let context = || ErrorContext::new("batch_set").with_key(key);
        let mut table =
            self.tx.open_table(DATA_TABLE).map_err(|e| EngineError::backend(context(), e))?;
        table.insert(key, value).map_err(|e| EngineError::backend(context(), e))?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        let context = || ErrorContext::new("batch_delete").with_key(key);
        let mut table =
            self.tx.open_table(DATA_TABLE).map_err(|e| EngineError::backend(context(), e))?;
        table.remove(key).map_err(|e| EngineError::backend(context(), e))?;
        Ok(())
    }

    fn commit(mut self, durability: Durability) -> EngineResult<()> {
        self.tx.set_durability(to_redb_durability(durability));
        self.tx.commit().map_err(|e| EngineError::backend(ErrorContext::new("batch_commit"), e))
    }

    fn abort(self) -> EngineResult<()> {
        self.tx.abort().map_err(|e| EngineError::backend(ErrorContext::new("batch_abort"), e))
    }
}

fn begin_write(db: &Database, context: &ErrorContext) -> EngineResult<WriteTransaction> {
    db.begin_write().map_err(|e| EngineError::backend(context.clone(), e.to_string()))
}

const fn to_redb_durability(durability: Durability) -> redb::Durability {
    match durability {
        Durability::Eventual => redb::Durability::Eventual,
        Durability::Immediate => redb::Durability::Immediate,
    }
}
