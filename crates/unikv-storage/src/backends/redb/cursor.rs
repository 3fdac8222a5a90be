//! Redb cursor implementation.
//!
//! A [`RedbCursor`] holds a read-only table opened in its own read
//! transaction, so it observes the snapshot taken when it was created.
//! Every seek and step is a single bounded B-tree lookup: the cursor builds
//! the narrowest key interval that can contain the target, clips it to the
//! cursor's range and takes the first or last entry from it. Nothing beyond
//! the current entry is buffered.

use std::ops::Bound;

use crate::engine::{Direction, EngineCursor, EngineError, ErrorContext, KeyRange, KeyValue};

use super::tables::DataTable;

/// Which end of a looked-up interval to take.
#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

/// A bidirectional, seekable cursor over a Redb table snapshot.
pub struct RedbCursor {
    table: DataTable,
    range: KeyRange,
    direction: Direction,
    current: Option<KeyValue>,
    error: Option<EngineError>,
}

impl RedbCursor {
    /// Create an unpositioned cursor over `table`, scoped to `range`.
    pub(crate) const fn new(table: DataTable, range: KeyRange, direction: Direction) -> Self {
        Self { table, range, direction, current: None, error: None }
    }

    fn lower(&self) -> Bound<&[u8]> {
        self.range.start().map_or(Bound::Unbounded, Bound::Included)
    }

    fn upper(&self) -> Bound<&[u8]> {
        self.range.end().map_or(Bound::Unbounded, Bound::Excluded)
    }

    fn current_key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(key, _)| key.as_slice())
    }

    /// Take the first or last entry within `(lower, upper)`.
    fn lookup(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        end: End,
    ) -> Result<Option<KeyValue>, redb::StorageError> {
        if is_empty_span(lower, upper) {
            return Ok(None);
        }

        let mut entries = self.table.range::<&[u8]>((lower, upper))?;
        let entry = match end {
            End::Front => entries.next(),
            End::Back => entries.next_back(),
        };

        Ok(entry.transpose()?.map(|(key, value)| (key.value().to_vec(), value.value().to_vec())))
    }

    /// Record the outcome of a lookup, latching the first failure.
    fn settle(&mut self, operation: &'static str, result: Result<Option<KeyValue>, redb::StorageError>) {
        match result {
            Ok(entry) => self.current = entry,
            Err(e) => {
                self.current = None;
                self.error = Some(EngineError::backend(ErrorContext::new(operation), e));
            }
        }
    }
}

impl EngineCursor for RedbCursor {
    fn seek_first(&mut self) {
        if self.error.is_some() {
            return;
        }
        let result = self.lookup(self.lower(), self.upper(), End::Front);
        self.settle("seek_first", result);
    }

    fn seek_last(&mut self) {
        if self.error.is_some() {
            return;
        }
        let result = self.lookup(self.lower(), self.upper(), End::Back);
        self.settle("seek_last", result);
    }

    fn seek_to(&mut self, key: &[u8]) {
        if self.error.is_some() {
            return;
        }
        let result = match self.direction {
            Direction::Forward => {
                let lower = match self.range.start() {
                    Some(start) if start > key => Bound::Included(start),
                    _ => Bound::Included(key),
                };
                self.lookup(lower, self.upper(), End::Front)
            }
            Direction::Reverse => {
                let upper = match self.range.end() {
                    Some(end) if key >= end => Bound::Excluded(end),
                    _ => Bound::Included(key),
                };
                self.lookup(self.lower(), upper, End::Back)
            }
        };
        self.settle("seek_to", result);
    }

    fn step_forward(&mut self) {
        if self.error.is_some() {
            return;
        }
        let Some(key) = self.current_key() else {
            return;
        };
        let result = self.lookup(Bound::Excluded(key), self.upper(), End::Front);
        self.settle("step_forward", result);
    }

    fn step_backward(&mut self) {
        if self.error.is_some() {
            return;
        }
        let Some(key) = self.current_key() else {
            return;
        };
        let result = self.lookup(self.lower(), Bound::Excluded(key), End::Back);
        self.settle("step_backward", result);
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.current.as_ref().map(|(key, value)| (key.as_slice(), value.as_slice()))
    }

    fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }
}

/// Whether no key can satisfy both bounds.
fn is_empty_span(lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> bool {
    match (lower, upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo) | Bound::Excluded(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi)) => lo >= hi,
        _ => false,
    }
}
