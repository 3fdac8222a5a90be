//! Storage backend implementations.
//!
//! This module contains the engine adapters bound to the capability interface.
//!
//! # Available Backends
//!
//! - [`redb`] - Native ordered adapter: bidirectional, seekable cursors over Redb
//! - [`emulated`] - Cursor emulation for engines with only forward sorted queries
//! - [`sqlite`] - SQLite row store, plugged into [`emulated::CursorEmulated`]

pub mod emulated;
pub mod redb;
pub mod sqlite;

pub use self::emulated::{CursorEmulated, EmulatedCursor, EmulatedWriteGroup};
pub use self::redb::{RedbConfig, RedbCursor, RedbEngine, RedbWriteGroup};
pub use self::sqlite::{SqliteConfig, SqliteRows, SqliteSnapshot, SqliteStore};
