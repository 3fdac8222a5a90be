//! The emulated cursor.

use crate::engine::{Direction, EngineCursor, EngineError, EngineResult, KeyRange, KeyValue, Order};

use super::{RowCursor, RowStore};

/// Where rows are currently being pulled from.
enum Rows<'a, S: RowStore + 'a> {
    /// A live query in the store's own order.
    Stream(S::Rows<'a>),
    /// An ascending result held in memory and consumed from its tail.
    Buffered(Vec<KeyValue>),
}

impl<'a, S: RowStore + 'a> Rows<'a, S> {
    fn next(&mut self) -> EngineResult<Option<KeyValue>> {
        match self {
            Self::Stream(rows) => rows.next_row(),
            Self::Buffered(rows) => Ok(rows.pop()),
        }
    }
}

/// A seekable, bidirectional cursor built from forward-only queries.
///
/// The cursor follows one query at a time. Moving with the query's order
/// pulls the next row; moving against it re-issues the query in the other
/// order and skips past the current key. The first failure ends the cursor
/// and is kept for [`error`](EngineCursor::error). All queries read the
/// snapshot the cursor was created with.
pub struct EmulatedCursor<'a, S: RowStore + 'a> {
    store: &'a S,
    snapshot: S::Snapshot<'a>,
    range: KeyRange,
    direction: Direction,
    order: Order,
    rows: Option<Rows<'a, S>>,
    current: Option<KeyValue>,
    error: Option<EngineError>,
}

impl<'a, S: RowStore + 'a> EmulatedCursor<'a, S> {
    pub(crate) fn new(
        store: &'a S,
        snapshot: S::Snapshot<'a>,
        range: KeyRange,
        direction: Direction,
    ) -> Self {
        Self {
            store,
            snapshot,
            range,
            direction,
            order: Order::Ascending,
            rows: None,
            current: None,
            error: None,
        }
    }

    /// Replace the active query with a fresh one in `order`.
    ///
    /// Returns `false` if the query failed; the failure is latched.
    fn open(&mut self, order: Order) -> bool {
        self.rows = None;
        self.current = None;

        let rows = match order {
            Order::Descending if !self.store.supports_descending() => self.buffer_descending(),
            _ => self.store.query(&self.snapshot, &self.range, order).map(Rows::Stream),
        };

        match rows {
            Ok(rows) => {
                self.rows = Some(rows);
                self.order = order;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Drain an ascending query so its rows can be replayed largest first.
    fn buffer_descending(&self) -> EngineResult<Rows<'a, S>> {
        let store: &'a S = self.store;
        let mut rows = store.query(&self.snapshot, &self.range, Order::Ascending)?;
        let mut buffer = Vec::new();
        while let Some(row) = rows.next_row()? {
            buffer.push(row);
        }
        Ok(Rows::Buffered(buffer))
    }

    /// Move to the next row of the active query.
    fn pull(&mut self) {
        let Some(rows) = self.rows.as_mut() else {
            self.current = None;
            return;
        };
        match rows.next() {
            Ok(row) => self.current = row,
            Err(e) => self.fail(e),
        }
    }

    /// Pull rows, discarding each one whose key matches `skip`.
    fn pull_while(&mut self, skip: impl Fn(&[u8]) -> bool) {
        loop {
            self.pull();
            match &self.current {
                Some((key, _)) if skip(key.as_slice()) => continue,
                _ => break,
            }
        }
    }

    fn fail(&mut self, error: EngineError) {
        self.rows = None;
        self.current = None;
        self.error = Some(error);
    }
}

impl<'a, S: RowStore + 'a> EngineCursor for EmulatedCursor<'a, S> {
    fn seek_first(&mut self) {
        if self.error.is_none() && self.open(Order::Ascending) {
            self.pull();
        }
    }

    fn seek_last(&mut self) {
        if self.error.is_none() && self.open(Order::Descending) {
            self.pull();
        }
    }

    fn seek_to(&mut self, key: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.direction {
            Direction::Forward => {
                if self.open(Order::Ascending) {
                    self.pull_while(|row| row < key);
                }
            }
            Direction::Reverse => {
                if self.open(Order::Descending) {
                    self.pull_while(|row| row > key);
                }
            }
        }
    }

    fn step_forward(&mut self) {
        let Some(key) = self.current.as_ref().map(|(key, _)| key.clone()) else {
            return;
        };
        if self.order == Order::Ascending {
            self.pull();
            return;
        }

        if self.open(Order::Ascending) {
            self.pull_while(|row| row <= key.as_slice());
        }
    }

    fn step_backward(&mut self) {
        let Some(key) = self.current.as_ref().map(|(key, _)| key.clone()) else {
            return;
        };
        if self.order == Order::Descending {
            self.pull();
            return;
        }

        if self.open(Order::Descending) {
            self.pull_while(|row| row >= key.as_slice());
        }
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.current.as_ref().map(|(key, value)| (key.as_slice(), value.as_slice()))
    }

    fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }
}
