//! The cursor-emulated engine adapter.

use crate::engine::{
    Capabilities, Direction, Durability, EngineResult, EngineStats, KeyRange, KvEngine, Operation,
    WriteGroup,
};

use super::{EmulatedCursor, RowStore};

/// Binds a [`RowStore`] to the capability interface.
///
/// Point operations forward to the store unchanged. Cursors are emulated on
/// top of [`RowStore::query`] against a snapshot taken when the cursor is
/// opened, and write groups buffer their operations
/// until commit hands them to [`RowStore::apply`].
#[derive(Debug)]
pub struct CursorEmulated<S> {
    store: S,
}

impl<S: RowStore> CursorEmulated<S> {
    /// Wrap a row store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped row store.
    pub const fn store(&self) -> &S {
        &self.store
    }

}

impl<S: RowStore> KvEngine for CursorEmulated<S> {
    type Cursor<'a>
        = EmulatedCursor<'a, S>
    where
        Self: 'a;

    type WriteGroup<'a>
        = EmulatedWriteGroup<'a, S>
    where
        Self: 'a;

    fn name(&self) -> &'static str {
        self.store.name()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { native_reverse: self.store.supports_descending(), native_seek: false }
    }

    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.store.select(key)
    }

    fn put(&self, key: &[u8], value: &[u8], durability: Durability) -> EngineResult<()> {
        self.store.upsert(key, value, durability)
    }

    fn delete(&self, key: &[u8], durability: Durability) -> EngineResult<()> {
        self.store.remove(key, durability)
    }

    fn cursor(&self, range: &KeyRange, direction: Direction) -> EngineResult<Self::Cursor<'_>> {
        let snapshot = self.store.snapshot()?;
        Ok(EmulatedCursor::new(&self.store, snapshot, range.clone(), direction))
    }

    fn begin_write_group(&self) -> EngineResult<Self::WriteGroup<'_>> {
        Ok(EmulatedWriteGroup { store: &self.store, operations: Vec::new() })
    }

    fn stats(&self) -> EngineResult<EngineStats> {
        self.store.stats()
    }

    // Relational engines reclaim space for the whole file at once.
    fn compact(&self, _range: &KeyRange) -> EngineResult<()> {
        self.store.compact()
    }

    fn flush(&self) -> EngineResult<()> {
        self.store.flush()
    }
}

/// A write group that buffers operations for one [`RowStore::apply`] call.
pub struct EmulatedWriteGroup<'a, S> {
    store: &'a S,
    operations: Vec<Operation>,
}

impl<S: RowStore> WriteGroup for EmulatedWriteGroup<'_, S> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.operations.push(Operation::Set { key: key.to_vec(), value: value.to_vec() });
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        self.operations.push(Operation::Delete { key: key.to_vec() });
        Ok(())
    }

    fn commit(self, durability: Durability) -> EngineResult<()> {
        if self.operations.is_empty() {
            return Ok(());
        }
        self.store.apply(&self.operations, durability)
    }

    fn abort(self) -> EngineResult<()> {
        Ok(())
    }
}
