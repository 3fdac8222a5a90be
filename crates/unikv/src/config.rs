//! Store configuration.

use serde::{Deserialize, Serialize};
use unikv_storage::backends::{RedbConfig, SqliteConfig};

/// Configuration options for opening a store.
///
/// Every field has a default, so a host can deserialize a partial document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Treat every write as durable, regardless of which method was called.
    pub force_sync: bool,
    /// Options for the Redb backend.
    pub redb: RedbConfig,
    /// Options for the SQLite backend.
    pub sqlite: SqliteConfig,
}

impl StoreConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether every write is made durable.
    #[must_use]
    pub const fn force_sync(mut self, force: bool) -> Self {
        self.force_sync = force;
        self
    }

    /// Set the Redb options.
    #[must_use]
    pub const fn redb(mut self, config: RedbConfig) -> Self {
        self.redb = config;
        self
    }

    /// Set the SQLite options.
    #[must_use]
    pub const fn sqlite(mut self, config: SqliteConfig) -> Self {
        self.sqlite = config;
        self
    }
}
