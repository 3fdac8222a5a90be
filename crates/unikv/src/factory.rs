//! Opening stores.
//!
//! A [`StoreFactory`] is built once at process start and passed by reference
//! to whatever needs to open a store. It carries the configuration and the
//! optional operation sink every store it opens will share.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use unikv_storage::backends::{RedbEngine, SqliteStore};
use unikv_storage::CursorEmulated;

use crate::backend::{Backend, BackendKind};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::metrics::OperationSink;
use crate::store::Store;

/// Opens stores with a shared configuration and sink.
#[derive(Clone, Default)]
pub struct StoreFactory {
    config: StoreConfig,
    sink: Option<Arc<dyn OperationSink>>,
}

impl StoreFactory {
    /// Create a factory that opens stores with `config`.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config, sink: None }
    }

    /// Report every operation of every opened store to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn OperationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The configuration stores are opened with.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open or create the store `name` in `dir`.
    ///
    /// The database file is `<dir>/<name>.<extension>`; `dir` is created if
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the directory cannot be
    /// created, or the engine failure if the database cannot be opened.
    pub fn open(&self, kind: BackendKind, name: &str, dir: impl AsRef<Path>) -> Result<Store<Backend>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{name}.{}", kind.extension()));

        let backend = match kind {
            BackendKind::Redb => {
                Backend::NativeOrdered(RedbEngine::open_with_config(&path, self.config.redb)?)
            }
            BackendKind::Sqlite => Backend::CursorEmulated(CursorEmulated::new(SqliteStore::open(
                &path,
                self.config.sqlite,
            )?)),
        };
        debug!(backend = %kind, path = %path.display(), "opened store");

        Ok(self.wrap(backend).with_name(name))
    }

    /// Like [`open`](Self::open), selecting the backend by its registered name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBackend`](crate::Error::UnknownBackend) for an
    /// unrecognized name, otherwise as [`open`](Self::open).
    pub fn open_by_name(&self, backend: &str, name: &str, dir: impl AsRef<Path>) -> Result<Store<Backend>> {
        self.open(backend.parse()?, name, dir)
    }

    /// Open a private scratch store, lost when the store is dropped.
    ///
    /// Redb keeps it in memory. SQLite keeps it in a temporary directory,
    /// since its read snapshots need a second connection to the same file.
    /// The store is named after its backend.
    ///
    /// # Errors
    ///
    /// Returns the engine failure if the database cannot be created.
    pub fn open_in_memory(&self, kind: BackendKind) -> Result<Store<Backend>> {
        let backend = match kind {
            BackendKind::Redb => Backend::NativeOrdered(RedbEngine::in_memory()?),
            BackendKind::Sqlite => {
                Backend::CursorEmulated(CursorEmulated::new(SqliteStore::temporary(self.config.sqlite)?))
            }
        };
        Ok(self.wrap(backend))
    }

    fn wrap(&self, backend: Backend) -> Store<Backend> {
        let store = Store::with_config(backend, self.config);
        match &self.sink {
            Some(sink) => store.with_sink(Arc::clone(sink)),
            None => store,
        }
    }
}
