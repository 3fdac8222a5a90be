//! Cursor emulation for relational-style engines.
//!
//! Engines such as SQLite offer point reads and writes plus a forward-only
//! sorted query, but no cursor that can be positioned at a key or moved
//! backwards. This module describes such an engine with the [`RowStore`]
//! trait and lifts it to the full capability interface with
//! [`CursorEmulated`]:
//!
//! - Ascending travel pulls the next row from an ascending query over the
//!   cursor's range.
//! - Descending travel pulls from a descending query when the store can
//!   produce one. Otherwise the whole ascending result is buffered and
//!   consumed from its tail. That costs memory proportional to the size of
//!   the range, but the rows and their order are identical.
//! - Seeking re-issues the query and discards rows until the target is
//!   reached, so a seek costs the distance traversed.
//!
//! Every query a cursor issues reads the same [`RowStore::Snapshot`], taken
//! when the cursor is created, so writes committed while it is open are never
//! observed. Query and row failures are latched by the cursor and end it.

mod cursor;
mod engine;

#[cfg(test)]
pub(crate) mod testing;

pub use cursor::EmulatedCursor;
pub use engine::{CursorEmulated, EmulatedWriteGroup};

use crate::engine::{Durability, EngineResult, EngineStats, KeyRange, KeyValue, Operation, Order};

/// A forward-only stream of rows produced by a [`RowStore`] query.
pub trait RowCursor {
    /// Pull the next row, or `None` once the query is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails while producing the row.
    fn next_row(&mut self) -> EngineResult<Option<KeyValue>>;
}

/// An engine exposing point operations and sorted, range-filtered queries.
///
/// Presence must be decided by whether a row exists, never by the length of
/// its value: a row holding an empty value is present.
pub trait RowStore: Send + Sync {
    /// A read view of the store, fixed at the moment it was taken.
    type Snapshot<'a>: Clone
    where
        Self: 'a;

    /// The row stream returned by [`query`](Self::query).
    type Rows<'a>: RowCursor
    where
        Self: 'a;

    /// A short, stable name for the engine.
    fn name(&self) -> &'static str;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn select(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Insert or replace the row for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn upsert(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()>;

    /// Delete the row for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove(&self, key: &[u8], durability: Durability) -> EngineResult<()>;

    /// Pin the current contents of the store for later queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the read view cannot be established.
    fn snapshot(&self) -> EngineResult<Self::Snapshot<'_>>;

    /// Stream the rows of `range` as seen by `snapshot`, sorted by key.
    ///
    /// Stores that return `false` from
    /// [`supports_descending`](Self::supports_descending) are only ever
    /// asked for [`Order::Ascending`].
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be issued.
    fn query<'a>(
        &'a self,
        snapshot: &Self::Snapshot<'a>,
        range: &KeyRange,
        order: Order,
    ) -> EngineResult<Self::Rows<'a>>;

    /// Whether [`query`](Self::query) can sort descending.
    fn supports_descending(&self) -> bool;

    /// Apply `operations` in order as one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit could not be applied; nothing is applied
    /// in that case.
    fn apply(&self, operations: &[Operation], durability: Durability) -> EngineResult<()>;

    /// Engine-specific statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics cannot be read.
    fn stats(&self) -> EngineResult<EngineStats> {
        Ok(EngineStats::new())
    }

    /// Reclaim unused space.
    ///
    /// # Errors
    ///
    /// Returns an error if compaction fails.
    fn compact(&self) -> EngineResult<()> {
        Ok(())
    }

    /// Push buffered writes to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&self) -> EngineResult<()> {
        Ok(())
    }
}
