//! Atomic write batches.
//!
//! A [`WriteBatch`] buffers set and delete operations without touching the
//! store. Committing replays them, in order, into one engine write group,
//! so the store moves from its pre-commit state to the fully applied state
//! with nothing observable in between. A key written more than once ends up
//! with its last operation, exactly as if the operations had been applied
//! one by one.
//!
//! Commit and discard both close the batch. A closed batch rejects every
//! further set, delete and commit with [`Error::BatchClosed`].

use tracing::{debug, warn};
use unikv_storage::{Durability, KvEngine, Operation, WriteGroup};

use crate::error::{check_key, Error, Result};
use crate::store::Store;

/// A buffered, atomic group of writes.
///
/// Dropping an open batch discards it.
///
/// # Example
///
/// ```ignore
/// let mut batch = store.new_batch();
/// batch.set(b"x", b"1")?;
/// batch.delete(b"x")?;
/// batch.set(b"x", b"2")?;
/// batch.commit()?;
/// assert_eq!(store.get(b"x")?, Some(b"2".to_vec()));
/// ```
pub struct WriteBatch<'s, E: KvEngine> {
    store: &'s Store<E>,
    operations: Vec<Operation>,
    closed: bool,
}

impl<'s, E: KvEngine> WriteBatch<'s, E> {
    pub(crate) const fn new(store: &'s Store<E>) -> Self {
        Self { store, operations: Vec::new(), closed: false }
    }

    /// Buffer a write of `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key and
    /// [`Error::BatchClosed`] once the batch is closed.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        self.ensure_open()?;
        self.operations.push(Operation::Set { key: key.to_vec(), value: value.to_vec() });
        Ok(())
    }

    /// Buffer a removal of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyEmpty`] for an empty key and
    /// [`Error::BatchClosed`] once the batch is closed.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        self.ensure_open()?;
        self.operations.push(Operation::Delete { key: key.to_vec() });
        Ok(())
    }

    /// Apply every buffered operation atomically and close the batch.
    ///
    /// The batch is closed even if the commit fails; the store then holds
    /// its pre-commit state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchClosed`] if the batch is already closed, or the
    /// engine failure that prevented the commit.
    pub fn commit(&mut self) -> Result<()> {
        self.commit_with(false, "batch_commit")
    }

    /// Like [`commit`](Self::commit), but blocks until the writes are on
    /// stable storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchClosed`] if the batch is already closed, or the
    /// engine failure that prevented the commit.
    pub fn commit_durable(&mut self) -> Result<()> {
        self.commit_with(true, "batch_commit_durable")
    }

    /// Drop every buffered operation and close the batch.
    ///
    /// Safe to call any number of times, including after a commit.
    pub fn discard(&mut self) {
        self.operations.clear();
        self.closed = true;
    }

    /// Number of buffered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operations are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether the batch has been committed or discarded.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::BatchClosed)
        } else {
            Ok(())
        }
    }

    fn commit_with(&mut self, durable: bool, operation: &'static str) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        let operations = std::mem::take(&mut self.operations);
        let durability = self.store.durability(durable);

        self.store.observe(operation, || apply(self.store.engine(), &operations, durability))
    }
}

impl<E: KvEngine> Drop for WriteBatch<'_, E> {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Replay `operations` into a single write group.
fn apply<E: KvEngine>(engine: &E, operations: &[Operation], durability: Durability) -> Result<()> {
    if operations.is_empty() {
        return Ok(());
    }

    let mut group = engine.begin_write_group()?;
    for operation in operations {
        let result = match operation {
            Operation::Set { key, value } => group.set(key, value),
            Operation::Delete { key } => group.delete(key),
        };
        if let Err(e) = result {
            if let Err(abort_error) = group.abort() {
                warn!(error = %abort_error, "failed to abort write group");
            }
            return Err(e.into());
        }
    }
    group.commit(durability)?;

    debug!(operations = operations.len(), ?durability, engine = engine.name(), "committed batch");
    Ok(())
}
