//! Bounded, directional range iteration.
//!
//! A [`RangeIterator`] is written once against [`EngineCursor`] and behaves
//! identically over native and emulated cursors. It is in one of two states:
//! positioned on an entry, or invalid. Invalid is absorbing: once the
//! iterator leaves the range, runs out of entries, sees an engine failure or
//! is released, it never becomes valid again.
//!
//! Validity is re-checked after construction and after every advance:
//!
//! 1. An invalid iterator stays invalid.
//! 2. A cursor that reports an error invalidates the iterator; the error
//!    stays available through [`RangeIterator::error`].
//! 3. An exhausted cursor invalidates the iterator.
//! 4. Going forward, a key at or past the end bound invalidates it.
//! 5. Going backward, a key before the start bound invalidates it.
//!
//! Reading or advancing an invalid iterator is a caller defect and panics.

use unikv_storage::{Direction, EngineCursor, EngineError, KeyRange, KeyValue};

use crate::error::{Error, Result};

/// An iterator over the entries of a key range.
///
/// Every accessor returns an owned copy, so nothing handed out aliases the
/// iterator's internal buffers. Dropping the iterator releases it.
///
/// # Example
///
/// ```ignore
/// let mut iter = store.iterator(&KeyRange::starting_at(b"user:"))?;
/// while iter.is_valid() {
///     println!("{:?} => {:?}", iter.key(), iter.value());
///     iter.advance();
/// }
/// if let Some(e) = iter.error() {
///     return Err(e.clone().into());
/// }
/// ```
pub struct RangeIterator<C: EngineCursor> {
    cursor: Option<C>,
    domain: KeyRange,
    direction: Direction,
    valid: bool,
    error: Option<EngineError>,
    error_reported: bool,
}

impl<C: EngineCursor> RangeIterator<C> {
    /// Position `cursor` at the first entry of `domain` in `direction`.
    pub(crate) fn new(mut cursor: C, domain: KeyRange, direction: Direction) -> Self {
        match direction {
            Direction::Forward => match domain.start() {
                Some(start) => cursor.seek_to(start),
                None => cursor.seek_first(),
            },
            Direction::Reverse => match domain.end() {
                Some(end) => {
                    cursor.seek_to(end);
                    if cursor.current().is_some_and(|(key, _)| key >= end) {
                        cursor.step_backward();
                    }
                }
                None => cursor.seek_last(),
            },
        }

        let mut iter = Self {
            cursor: Some(cursor),
            domain,
            direction,
            valid: true,
            error: None,
            error_reported: false,
        };
        iter.check();
        iter
    }

    /// Whether the iterator is positioned on an entry.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// A copy of the current key.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is invalid or released.
    #[must_use]
    pub fn key(&self) -> Vec<u8> {
        self.current().0.to_vec()
    }

    /// A copy of the current value.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is invalid or released.
    #[must_use]
    pub fn value(&self) -> Vec<u8> {
        self.current().1.to_vec()
    }

    /// A copy of the current entry.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is invalid or released.
    #[must_use]
    pub fn entry(&self) -> KeyValue {
        let (key, value) = self.current();
        (key.to_vec(), value.to_vec())
    }

    /// Move to the next entry in the iterator's direction.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is invalid or released.
    pub fn advance(&mut self) {
        match self.cursor.as_mut() {
            Some(cursor) if self.valid => match self.direction {
                Direction::Forward => cursor.step_forward(),
                Direction::Reverse => cursor.step_backward(),
            },
            _ => misuse(),
        }
        self.check();
    }

    /// The engine failure that ended iteration, if any.
    ///
    /// Remains available after the iterator is released.
    #[must_use]
    pub const fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// The range this iterator is bound to.
    #[must_use]
    pub const fn domain(&self) -> &KeyRange {
        &self.domain
    }

    /// The direction of travel.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Release the engine cursor. Safe to call any number of times.
    pub fn release(&mut self) {
        self.valid = false;
        self.cursor = None;
    }

    fn current(&self) -> (&[u8], &[u8]) {
        match self.cursor.as_ref().and_then(|cursor| cursor.current()) {
            Some(entry) if self.valid => entry,
            _ => misuse(),
        }
    }

    /// Re-run the validity rules against the cursor's position.
    fn check(&mut self) {
        if !self.valid {
            return;
        }
        let Some(cursor) = self.cursor.as_ref() else {
            self.invalidate();
            return;
        };
        if let Some(error) = cursor.error() {
            self.error = Some(error.clone());
            self.invalidate();
            return;
        }
        let in_range = match cursor.current() {
            None => false,
            Some((key, _)) => match self.direction {
                Direction::Forward => self.domain.end().map_or(true, |end| key < end),
                Direction::Reverse => self.domain.start().map_or(true, |start| key >= start),
            },
        };
        if !in_range {
            self.invalidate();
        }
    }

    /// Enter the absorbing invalid state, dropping the cursor early.
    fn invalidate(&mut self) {
        self.valid = false;
        self.cursor = None;
    }
}

impl<C: EngineCursor> Iterator for RangeIterator<C> {
    type Item = Result<KeyValue>;

    /// Yield the current entry and advance. An engine failure is yielded
    /// once, after the last entry.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.valid {
            if self.error_reported {
                return None;
            }
            self.error_reported = true;
            return self.error.clone().map(|e| Err(e.into()));
        }
        let entry = self.entry();
        self.advance();
        Some(Ok(entry))
    }
}

impl<C: EngineCursor> Drop for RangeIterator<C> {
    fn drop(&mut self) {
        self.release();
    }
}

fn misuse() -> ! {
    panic!("{}", Error::IteratorMisuse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unikv_storage::ErrorContext;

    /// A cursor over a sorted vector that ignores ranges entirely, so the
    /// iterator's own bound checks are what keep keys in range.
    struct VecCursor {
        entries: Vec<KeyValue>,
        direction: Direction,
        position: Option<usize>,
        fail_after_steps: Option<usize>,
        error: Option<EngineError>,
    }

    impl VecCursor {
        fn new(keys: &[&[u8]], direction: Direction) -> Self {
            let mut entries: Vec<KeyValue> = keys.iter().map(|k| (k.to_vec(), k.to_vec())).collect();
            entries.sort();
            Self { entries, direction, position: None, fail_after_steps: None, error: None }
        }

        fn failing_after(mut self, steps: usize) -> Self {
            self.fail_after_steps = Some(steps);
            self
        }

        fn step(&mut self, forward: bool) {
            if let Some(steps) = self.fail_after_steps.as_mut() {
                if *steps == 0 {
                    self.position = None;
                    self.error = Some(EngineError::backend(ErrorContext::new("step"), "injected"));
                    return;
                }
                *steps -= 1;
            }
            self.position = match (self.position, forward) {
                (Some(p), true) if p + 1 < self.entries.len() => Some(p + 1),
                (Some(p), false) if p > 0 => Some(p - 1),
                _ => None,
            };
        }
    }

    impl EngineCursor for VecCursor {
        fn seek_first(&mut self) {
            self.position = (!self.entries.is_empty()).then_some(0);
        }

        fn seek_last(&mut self) {
            self.position = self.entries.len().checked_sub(1);
        }

        fn seek_to(&mut self, key: &[u8]) {
            self.position = match self.direction {
                Direction::Forward => self.entries.iter().position(|(k, _)| k.as_slice() >= key),
                Direction::Reverse => self.entries.iter().rposition(|(k, _)| k.as_slice() <= key),
            };
        }

        fn step_forward(&mut self) {
            self.step(true);
        }

        fn step_backward(&mut self) {
            self.step(false);
        }

        fn current(&self) -> Option<(&[u8], &[u8])> {
            self.position.map(|p| (self.entries[p].0.as_slice(), self.entries[p].1.as_slice()))
        }

        fn error(&self) -> Option<&EngineError> {
            self.error.as_ref()
        }
    }

    fn keys_of<C: EngineCursor>(iter: RangeIterator<C>) -> Vec<Vec<u8>> {
        iter.map(|entry| entry.expect("failed to read entry").0).collect()
    }

    fn owned(keys: &[&[u8]]) -> Vec<Vec<u8>> {
        keys.iter().map(|k| k.to_vec()).collect()
    }

    const KEYS: &[&[u8]] = &[b"a", b"b", b"c", b"d"];

    #[test]
    fn test_forward_stops_at_end_bound() {
        let cursor = VecCursor::new(KEYS, Direction::Forward);
        let iter = RangeIterator::new(cursor, KeyRange::new(b"b", b"d"), Direction::Forward);
        assert_eq!(keys_of(iter), owned(&[b"b", b"c"]));
    }

    #[test]
    fn test_reverse_steps_back_from_end_bound() {
        let cursor = VecCursor::new(KEYS, Direction::Reverse);
        let iter = RangeIterator::new(cursor, KeyRange::new(b"b", b"d"), Direction::Reverse);
        assert_eq!(keys_of(iter), owned(&[b"c", b"b"]));
    }

    #[test]
    fn test_reverse_unbounded_starts_at_last() {
        let cursor = VecCursor::new(KEYS, Direction::Reverse);
        let iter = RangeIterator::new(cursor, KeyRange::starting_at(b"b"), Direction::Reverse);
        assert_eq!(keys_of(iter), owned(&[b"d", b"c", b"b"]));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let cursor = VecCursor::new(KEYS, Direction::Forward);
        let iter = RangeIterator::new(cursor, KeyRange::new(b"c", b"b"), Direction::Forward);
        assert!(!iter.is_valid());

        let cursor = VecCursor::new(KEYS, Direction::Reverse);
        let iter = RangeIterator::new(cursor, KeyRange::new(b"c", b"b"), Direction::Reverse);
        assert!(!iter.is_valid());
    }

    #[test]
    fn test_accessors_return_copies() {
        let cursor = VecCursor::new(KEYS, Direction::Forward);
        let mut iter = RangeIterator::new(cursor, KeyRange::all(), Direction::Forward);

        let key = iter.key();
        let entry = iter.entry();
        iter.advance();
        assert_eq!(key, b"a".to_vec());
        assert_eq!(entry, (b"a".to_vec(), b"a".to_vec()));
        assert_eq!(iter.value(), b"b".to_vec());
    }

    #[test]
    fn test_error_invalidates_and_is_kept() {
        let cursor = VecCursor::new(KEYS, Direction::Forward).failing_after(1);
        let mut iter = RangeIterator::new(cursor, KeyRange::all(), Direction::Forward);

        assert!(iter.is_valid());
        iter.advance();
        assert!(iter.is_valid());
        iter.advance();
        assert!(!iter.is_valid());
        assert!(iter.error().is_some());

        iter.release();
        assert!(iter.error().is_some());
    }

    #[test]
    fn test_iterator_yields_error_once() {
        let cursor = VecCursor::new(KEYS, Direction::Forward).failing_after(1);
        let iter = RangeIterator::new(cursor, KeyRange::all(), Direction::Forward);

        let items: Vec<Result<KeyValue>> = iter.collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_ok());
        assert!(matches!(items[2], Err(Error::Engine(_))));
    }

    #[test]
    fn test_invalid_is_absorbing() {
        let cursor = VecCursor::new(KEYS, Direction::Forward);
        let mut iter = RangeIterator::new(cursor, KeyRange::ending_before(b"b"), Direction::Forward);

        iter.advance();
        assert!(!iter.is_valid());
        assert_eq!(iter.next().map(|r| r.is_ok()), None);
        assert!(!iter.is_valid());
    }

    #[test]
    fn test_release_is_idempotent() {
        let cursor = VecCursor::new(KEYS, Direction::Forward);
        let mut iter = RangeIterator::new(cursor, KeyRange::all(), Direction::Forward);

        iter.release();
        iter.release();
        assert!(!iter.is_valid());
        assert!(iter.error().is_none());
        assert_eq!(iter.domain(), &KeyRange::all());
        assert_eq!(iter.direction(), Direction::Forward);
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn test_key_after_release_panics() {
        let cursor = VecCursor::new(KEYS, Direction::Forward);
        let mut iter = RangeIterator::new(cursor, KeyRange::all(), Direction::Forward);
        iter.release();
        let _ = iter.key();
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn test_advance_past_end_panics() {
        let cursor = VecCursor::new(&[b"a"], Direction::Forward);
        let mut iter = RangeIterator::new(cursor, KeyRange::all(), Direction::Forward);
        iter.advance();
        iter.advance();
    }
}
