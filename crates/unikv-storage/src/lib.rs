//! `unikv` Storage
//!
//! This crate provides the capability interface that every storage engine
//! adapter implements, plus the two adapters shipped with `unikv`.
//!
//! # Overview
//!
//! Engines come in two structurally different shapes. Some expose a genuine
//! bidirectional, seekable ordered cursor (LSM and B-tree engines). Others only
//! offer point lookups and a forward-only sorted query (relational engines).
//! Both are bound to the same [`KvEngine`] contract so that range iteration and
//! batched writes can be written once, on top of the contract, by the `unikv`
//! crate.
//!
//! # Core Traits
//!
//! - [`KvEngine`] - Point operations, cursors and write groups
//! - [`EngineCursor`] - Positioning primitives in logical key order
//! - [`WriteGroup`] - The engine's atomic grouping primitive
//! - [`RowStore`] / [`RowCursor`] - What a relational engine must offer to be
//!   wrapped by [`CursorEmulated`]
//!
//! # Adapters
//!
//! - [`backends::redb`] - Native ordered adapter over Redb
//! - [`backends::emulated`] - Cursor emulation over any [`RowStore`]
//! - [`backends::sqlite`] - A [`RowStore`] backed by SQLite
//!
//! # Error Handling
//!
//! All engine operations return [`EngineResult<T>`]. Cursor movement never
//! returns errors directly; a failure is latched and reported through
//! [`EngineCursor::error`].
//!
//! # Example
//!
//! ```ignore
//! use unikv_storage::backends::RedbEngine;
//! use unikv_storage::{Direction, Durability, EngineCursor, KeyRange, KvEngine};
//!
//! let engine = RedbEngine::in_memory()?;
//! engine.put(b"a", b"1", Durability::Eventual)?;
//!
//! let mut cursor = engine.cursor(&KeyRange::all(), Direction::Forward)?;
//! cursor.seek_first();
//! assert_eq!(cursor.current(), Some((b"a".as_slice(), b"1".as_slice())));
//! ```

pub mod backends;
pub mod engine;

pub use backends::emulated::{CursorEmulated, EmulatedCursor, RowCursor, RowStore};
pub use engine::{
    Capabilities, Direction, Durability, EngineCursor, EngineError, EngineResult, EngineStats,
    ErrorContext, KeyRange, KeyValue, KvEngine, Operation, Order, WriteGroup,
};
