//! Value types shared by the capability interface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An owned key-value pair.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Engine statistics, keyed by a backend-specific metric name.
pub type EngineStats = BTreeMap<String, String>;

/// How long a write may stay in volatile buffers after the call returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    /// Returns once the write is logically applied; persistence follows the
    /// engine's own policy.
    #[default]
    Eventual,
    /// Blocks until the write has reached stable storage.
    Immediate,
}

impl Durability {
    /// Map the contract's `durable` flag onto a durability level.
    #[must_use]
    pub const fn from_durable(durable: bool) -> Self {
        if durable {
            Self::Immediate
        } else {
            Self::Eventual
        }
    }

    /// Whether the write must be persisted before returning.
    #[must_use]
    pub const fn is_durable(self) -> bool {
        matches!(self, Self::Immediate)
    }
}

/// Direction of travel for a range iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending key order.
    Forward,
    /// Descending key order.
    Reverse,
}

/// Sort order requested from a relational query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// `ORDER BY key ASC`.
    Ascending,
    /// `ORDER BY key DESC`.
    Descending,
}

/// Which cursor primitives an engine provides natively.
///
/// Engines lacking a capability still implement every [`EngineCursor`]
/// method, falling back to emulation.
///
/// [`EngineCursor`]: super::EngineCursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The engine can walk keys in descending order without buffering.
    pub native_reverse: bool,
    /// The engine can position a cursor at an arbitrary key in `O(log n)`.
    pub native_seek: bool,
}

impl Capabilities {
    /// Capabilities of an engine with a true bidirectional seekable cursor.
    pub const NATIVE: Self = Self { native_reverse: true, native_seek: true };
}

/// A half-open key interval `[start, end)`; either bound may be unbounded.
///
/// A range whose start is not below its end is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyRange {
    start: Option<Vec<u8>>,
    end: Option<Vec<u8>>,
}

impl KeyRange {
    /// The range covering every key.
    #[must_use]
    pub const fn all() -> Self {
        Self { start: None, end: None }
    }

    /// `[start, end)`.
    #[must_use]
    pub fn new(start: impl AsRef<[u8]>, end: impl AsRef<[u8]>) -> Self {
        Self { start: Some(start.as_ref().to_vec()), end: Some(end.as_ref().to_vec()) }
    }

    /// `[start, unbounded)`.
    #[must_use]
    pub fn starting_at(start: impl AsRef<[u8]>) -> Self {
        Self { start: Some(start.as_ref().to_vec()), end: None }
    }

    /// `(unbounded, end)`.
    #[must_use]
    pub fn ending_before(end: impl AsRef<[u8]>) -> Self {
        Self { start: None, end: Some(end.as_ref().to_vec()) }
    }

    /// Build a range from optional bounds.
    #[must_use]
    pub fn bounds(start: Option<&[u8]>, end: Option<&[u8]>) -> Self {
        Self { start: start.map(<[u8]>::to_vec), end: end.map(<[u8]>::to_vec) }
    }

    /// The inclusive lower bound.
    #[must_use]
    pub fn start(&self) -> Option<&[u8]> {
        self.start.as_deref()
    }

    /// The exclusive upper bound.
    #[must_use]
    pub fn end(&self) -> Option<&[u8]> {
        self.end.as_deref()
    }

    /// Whether `key` falls inside the range.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.start().map_or(true, |start| key >= start) && self.end().map_or(true, |end| key < end)
    }

    /// Whether no key can fall inside the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.start(), self.end()), (Some(start), Some(end)) if start >= end)
    }

    /// Whether either bound is an explicit zero-length key.
    #[must_use]
    pub fn has_empty_bound(&self) -> bool {
        self.start().is_some_and(<[u8]>::is_empty) || self.end().is_some_and(<[u8]>::is_empty)
    }
}

/// A buffered write, applied in order by a [`WriteGroup`].
///
/// [`WriteGroup`]: super::WriteGroup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Store `value` under `key`.
    Set {
        /// The key to write.
        key: Vec<u8>,
        /// The value to store; may be empty.
        value: Vec<u8>,
    },
    /// Remove `key` if present.
    Delete {
        /// The key to remove.
        key: Vec<u8>,
    },
}
