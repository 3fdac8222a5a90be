//! SQLite row store.
//!
//! SQLite is the relational engine behind the cursor-emulated adapter. Every
//! entry is a row of a single `WITHOUT ROWID` table keyed by a BLOB primary
//! key, so the primary key index already returns rows in byte order. Range
//! queries are streamed one page at a time with keyset pagination: each page
//! is a bounded `SELECT` that resumes after the last key of the previous one.
//! The pages of one cursor are all read inside a single read transaction on
//! a dedicated connection, a [`SqliteSnapshot`], which WAL mode lets run
//! alongside writers.
//!
//! # Example
//!
//! ```ignore
//! use unikv_storage::backends::{SqliteConfig, SqliteStore};
//! use unikv_storage::{CursorEmulated, Durability, KvEngine};
//!
//! let engine = CursorEmulated::new(SqliteStore::open("my_database.sqlite", SqliteConfig::default())?);
//! engine.put(b"user:1", b"Alice", Durability::Immediate)?;
//! ```

mod rows;
mod store;

pub use rows::SqliteRows;
pub use store::{SqliteSnapshot, SqliteStore};

use serde::{Deserialize, Serialize};

/// Default number of rows fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default time to wait on a locked database, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Configuration options for the SQLite row store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Rows fetched per page when streaming a range.
    pub page_size: usize,
    /// Whether reverse iteration may issue `ORDER BY key DESC` queries.
    ///
    /// When disabled, reverse iteration buffers the ascending result instead.
    pub descending_queries: bool,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            descending_queries: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl SqliteConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of rows fetched per page.
    #[must_use]
    pub const fn page_size(mut self, rows: usize) -> Self {
        self.page_size = rows;
        self
    }

    /// Enable or disable descending queries.
    #[must_use]
    pub const fn descending_queries(mut self, enabled: bool) -> Self {
        self.descending_queries = enabled;
        self
    }

    /// Set the busy timeout.
    #[must_use]
    pub const fn busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }
}
