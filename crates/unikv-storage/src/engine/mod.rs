//! Storage engine traits and abstractions.
//!
//! This module defines the capability interface that engine adapters implement:
//!
//! - [`KvEngine`] - Point get/put/delete, range cursors and write groups
//! - [`EngineCursor`] - Ordered positioning over a key range
//! - [`WriteGroup`] - Atomic application of buffered operations
//!
//! # Error Handling
//!
//! All operations return [`EngineResult<T>`] which is an alias for
//! `Result<T, EngineError>`. See [`EngineError`] for the possible error variants.

mod error;
mod traits;
mod types;

pub use error::{DynError, EngineError, EngineResult, ErrorContext};
pub use traits::{EngineCursor, KvEngine, WriteGroup};
pub use types::{
    Capabilities, Direction, Durability, EngineStats, KeyRange, KeyValue, Operation, Order,
};
