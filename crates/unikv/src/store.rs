//! The store facade.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use tracing::debug;
use unikv_storage::{Direction, Durability, EngineStats, KeyRange, KvEngine};

use crate::batch::WriteBatch;
use crate::config::StoreConfig;
use crate::error::{check_key, Error, Result};
use crate::iterator::RangeIterator;
use crate::metrics::{self, OperationSink};

/// The range iterator type produced by a [`Store`] over engine `E`.
pub type StoreIterator<'a, E> = RangeIterator<<E as KvEngine>::Cursor<'a>>;

/// A key-value store over any engine adapter.
///
/// Point operations forward to the engine after validating the key. Range
/// iteration and batches go through [`RangeIterator`] and [`WriteBatch`],
/// which behave the same over every adapter.
///
/// A store is safe to share between threads; iterators and batches are
/// owned by the caller that created them.
pub struct Store<E: KvEngine> {
    engine: E,
    config: StoreConfig,
    name: String,
    sink: Option<Arc<dyn OperationSink>>,
}

impl<E: KvEngine> Store<E> {
    /// Create a store over `engine` with the default configuration.
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, StoreConfig::default())
    }

    /// Create a store over `engine` with the given configuration.
    ///
    /// The store is named after the engine until [`with_name`](Self::with_name)
    /// says otherwise.
    pub fn with_config(engine: E, config: StoreConfig) -> Self {
        let name = engine.name().to_owned();
        Self { engine, config, name, sink: None }
    }

    /// Name the store. The name labels every event sent to the sink.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Report every operation to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn OperationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The underlying engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The configuration the store was opened with.
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The name the store reports to its sink.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` as `operation`, reporting it to the sink if one is installed.
    pub(crate) fn observe<T>(&self, operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        metrics::observe(self.sink.as_deref(), &self.name, operation, f)
    }

    /// The durability for a write, after applying `force_sync`.
    pub(crate) const fn durability(&self, durable: bool) -> Durability {
        Durability::from_durable(durable || self.config.force_sync)
    }

    /// Look up a key. Absent keys return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key, or the engine failure.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        self.observe("get", || Ok(self.engine.get(key)?))
    }

    /// Whether a key is present. A key holding an empty value is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key, or the engine failure.
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        check_key(key)?;
        self.observe("has", || Ok(self.engine.get(key)?.is_some()))
    }

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key, or the engine failure.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put("set", key, value, false)
    }

    /// Store `value` under `key`, returning once it is on stable storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key, or the engine failure.
    pub fn set_durable(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put("set_durable", key, value, true)
    }

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key, or the engine failure.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.remove("delete", key, false)
    }

    /// Remove `key`, returning once the removal is on stable storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key, or the engine failure.
    pub fn delete_durable(&self, key: &[u8]) -> Result<()> {
        self.remove("delete_durable", key, true)
    }

    /// Iterate `range` in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] if a bound is an empty key, or the engine
    /// failure that prevented the cursor from opening.
    pub fn iterator(&self, range: &KeyRange) -> Result<StoreIterator<'_, E>> {
        self.open_iterator("iterator", range, Direction::Forward)
    }

    /// Iterate `range` in descending key order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] if a bound is an empty key, or the engine
    /// failure that prevented the cursor from opening.
    pub fn reverse_iterator(&self, range: &KeyRange) -> Result<StoreIterator<'_, E>> {
        self.open_iterator("reverse_iterator", range, Direction::Reverse)
    }

    /// Start a new, empty batch.
    pub const fn new_batch(&self) -> WriteBatch<'_, E> {
        WriteBatch::new(self)
    }

    /// Engine statistics.
    ///
    /// # Errors
    ///
    /// Returns the engine failure.
    pub fn stats(&self) -> Result<EngineStats> {
        self.observe("stats", || Ok(self.engine.stats()?))
    }

    /// Ask the engine to compact `range`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] if a bound is an empty key, or the engine
    /// failure.
    pub fn compact(&self, range: &KeyRange) -> Result<()> {
        check_range(range)?;
        self.observe("compact", || Ok(self.engine.compact(range)?))
    }

    /// Write every entry as one `[KEY]:\t[VALUE]` line, both in upper-case hex.
    ///
    /// # Errors
    ///
    /// Returns the engine failure, or [`Error::Io`] if writing fails.
    pub fn dump(&self, writer: &mut impl Write) -> Result<()> {
        for entry in self.iterator(&KeyRange::all())? {
            let (key, value) = entry?;
            writeln!(writer, "[{}]:\t[{}]", hex(&key), hex(&value))?;
        }
        Ok(())
    }

    /// Flush the engine and close the store.
    ///
    /// # Errors
    ///
    /// Returns the engine failure if the final flush fails.
    pub fn close(self) -> Result<()> {
        self.observe("close", || Ok(self.engine.flush()?))?;
        debug!(store = %self.name, engine = self.engine.name(), "closed store");
        Ok(())
    }

    fn put(&self, operation: &'static str, key: &[u8], value: &[u8], durable: bool) -> Result<()> {
        check_key(key)?;
        let durability = self.durability(durable);
        self.observe(operation, || Ok(self.engine.put(key, value, durability)?))
    }

    fn remove(&self, operation: &'static str, key: &[u8], durable: bool) -> Result<()> {
        check_key(key)?;
        let durability = self.durability(durable);
        self.observe(operation, || Ok(self.engine.delete(key, durability)?))
    }

    fn open_iterator(
        &self,
        operation: &'static str,
        range: &KeyRange,
        direction: Direction,
    ) -> Result<StoreIterator<'_, E>> {
        check_range(range)?;
        self.observe(operation, || {
            let cursor = self.engine.cursor(range, direction)?;
            Ok(RangeIterator::new(cursor, range.clone(), direction))
        })
    }
}

fn check_range(range: &KeyRange) -> Result<()> {
    if range.has_empty_bound() {
        Err(Error::KeyEmpty)
    } else {
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02X}");
        out
    })
}
