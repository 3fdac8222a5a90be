//! Core storage engine traits.
//!
//! This module defines the capability interface for engine adapters:
//!
//! - [`KvEngine`] - The main entry point for storage operations
//! - [`EngineCursor`] - Ordered positioning within a key range
//! - [`WriteGroup`] - The engine's atomic write-grouping primitive
//!
//! Keys handed to these traits are always non-empty; the `unikv` facade
//! rejects empty keys before any engine call is made.

use std::sync::Arc;

use super::{Capabilities, Direction, Durability, EngineResult, EngineStats, KeyRange};

/// A storage engine providing the minimal primitive set the key-value
/// contract is built on.
///
/// Implementations must be thread-safe (`Send + Sync`): point operations may
/// be invoked concurrently from many callers, and the engine is responsible
/// for serializing conflicting physical writes.
///
/// # Example
///
/// ```ignore
/// use unikv_storage::{Durability, KvEngine};
///
/// fn example<E: KvEngine>(engine: &E) -> unikv_storage::EngineResult<()> {
///     engine.put(b"key", b"value", Durability::Eventual)?;
///     assert_eq!(engine.get(b"key")?, Some(b"value".to_vec()));
///     Ok(())
/// }
/// ```
pub trait KvEngine: Send + Sync {
    /// The cursor type for range iteration.
    type Cursor<'a>: EngineCursor
    where
        Self: 'a;

    /// The write-group type used to commit batches.
    type WriteGroup<'a>: WriteGroup
    where
        Self: 'a;

    /// A short, stable name for the engine (used in logs and metrics).
    fn name(&self) -> &'static str;

    /// Which cursor primitives the engine supports natively.
    fn capabilities(&self) -> Capabilities;

    /// Look up a key.
    ///
    /// Returns `Ok(None)` when the key is absent and `Ok(Some(vec![]))` when it
    /// is present with an empty value; the two are never conflated.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the engine fails.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Store a value, replacing any previous value for the key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the write fails.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn put(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()>;

    /// Remove a key. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the write fails.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn delete(&self, key: &[u8], durability: Durability) -> EngineResult<()>;

    /// Create an unpositioned cursor scoped to `range`.
    ///
    /// `direction` tells the engine how the cursor will mostly travel; it also
    /// selects the meaning of [`EngineCursor::seek_to`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if a snapshot or query cannot be opened.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn cursor(&self, range: &KeyRange, direction: Direction) -> EngineResult<Self::Cursor<'_>>;

    /// Begin an atomic write group.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the engine cannot start one.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn begin_write_group(&self) -> EngineResult<Self::WriteGroup<'_>>;

    /// Engine-specific statistics.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the statistics cannot be read.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn stats(&self) -> EngineResult<EngineStats> {
        Ok(EngineStats::new())
    }

    /// Compact the given key range. The default implementation does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if compaction fails.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn compact(&self, _range: &KeyRange) -> EngineResult<()> {
        Ok(())
    }

    /// Flush any buffered data to durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Backend`] if the flush fails.
    ///
    /// [`EngineError::Backend`]: super::EngineError::Backend
    fn flush(&self) -> EngineResult<()> {
        Ok(())
    }
}

/// Positioning primitives over the entries of a key range.
///
/// All movement is expressed in logical key order, whatever order the engine
/// produces rows in. Movement never fails directly: a failure is latched,
/// after which [`current`](Self::current) returns `None` and
/// [`error`](Self::error) returns the failure.
pub trait EngineCursor {
    /// Position at the smallest key in the range.
    fn seek_first(&mut self);

    /// Position at the largest key in the range.
    fn seek_last(&mut self);

    /// Position near `key` in the cursor's direction of travel.
    ///
    /// Forward cursors land on the first key `>= key`; reverse cursors land
    /// on the last key `<= key`.
    fn seek_to(&mut self, key: &[u8]);

    /// Move to the next larger key.
    fn step_forward(&mut self);

    /// Move to the next smaller key.
    fn step_backward(&mut self);

    /// The entry under the cursor, or `None` once it is exhausted.
    fn current(&self) -> Option<(&[u8], &[u8])>;

    /// The failure that ended the cursor, if any.
    fn error(&self) -> Option<&super::EngineError>;
}

/// An engine's atomic write-grouping primitive.
///
/// Operations are applied in the order they are added. Nothing is visible
/// to readers until [`commit`](Self::commit) succeeds, and a failed commit
/// leaves the store unchanged.
pub trait WriteGroup {
    /// Add a set operation to the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the operation.
    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Add a delete operation to the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the operation.
    fn delete(&mut self, key: &[u8]) -> EngineResult<()>;

    /// Apply every operation atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the group could not be applied; in that case
    /// nothing was applied.
    fn commit(self, durability: Durability) -> EngineResult<()>;

    /// Drop every operation without touching the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to release the group.
    fn abort(self) -> EngineResult<()>;
}

// ============================================================================
// Blanket Implementations
// ============================================================================

/// Implement `KvEngine` for `Arc<E>` to allow shared ownership of engines.
impl<E: KvEngine> KvEngine for Arc<E> {
    type Cursor<'a>
        = E::Cursor<'a>
    where
        Self: 'a;

    type WriteGroup<'a>
        = E::WriteGroup<'a>
    where
        Self: 'a;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()> {
        (**self).put(key, value, durability)
    }

    fn delete(&self, key: &[u8], durability: Durability) -> EngineResult<()> {
        (**self).delete(key, durability)
    }

    fn cursor(&self, range: &KeyRange, direction: Direction) -> EngineResult<Self::Cursor<'_>> {
        (**self).cursor(range, direction)
    }

    fn begin_write_group(&self) -> EngineResult<Self::WriteGroup<'_>> {
        (**self).begin_write_group()
    }

    fn stats(&self) -> EngineResult<EngineStats> {
        (**self).stats()
    }

    fn compact(&self, range: &KeyRange) -> EngineResult<()> {
        (**self).compact(range)
    }

    fn flush(&self) -> EngineResult<()> {
        (**self).flush()
    }
}
