//! Redb storage backend.
//!
//! This module binds Redb, a pure-Rust embedded B-tree database, to the
//! capability interface as the native ordered adapter. Redb range scans are
//! double-ended and can start at any key, so every cursor primitive maps to a
//! native operation with no emulation cost.
//!
//! # Example
//!
//! ```ignore
//! use unikv_storage::backends::RedbEngine;
//! use unikv_storage::{Durability, KvEngine};
//!
//! let engine = RedbEngine::open("my_database.redb")?;
//! engine.put(b"user:1", b"Alice", Durability::Immediate)?;
//! assert_eq!(engine.get(b"user:1")?, Some(b"Alice".to_vec()));
//! ```
//!
//! # In-Memory Databases
//!
//! For testing, you can create an in-memory database that doesn't persist:
//!
//! ```ignore
//! let engine = RedbEngine::in_memory()?;
//! ```

mod cursor;
mod engine;
pub mod tables;

pub use cursor::RedbCursor;
pub use engine::{RedbConfig, RedbEngine, RedbWriteGroup};
