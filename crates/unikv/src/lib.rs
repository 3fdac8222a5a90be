//! # unikv
//!
//! A uniform key-value store over structurally different storage engines.
//!
//! Some engines offer a genuine bidirectional, seekable ordered cursor;
//! others only offer point lookups and a forward-only sorted query. `unikv`
//! binds both to one contract so that range iteration and atomic batches
//! behave identically whichever engine sits underneath.
//!
//! ## Quick Start
//!
//! ```ignore
//! use unikv::{BackendKind, KeyRange, StoreConfig, StoreFactory};
//!
//! let factory = StoreFactory::new(StoreConfig::default());
//! let store = factory.open(BackendKind::Sqlite, "app", "./data")?;
//!
//! store.set(b"user:1", b"Alice")?;
//! store.set(b"user:2", b"Bob")?;
//!
//! for entry in store.reverse_iterator(&KeyRange::starting_at(b"user:"))? {
//!     let (key, value) = entry?;
//!     println!("{key:?} => {value:?}");
//! }
//!
//! let mut batch = store.new_batch();
//! batch.delete(b"user:1")?;
//! batch.set(b"user:3", b"Carol")?;
//! batch.commit_durable()?;
//!
//! store.close()?;
//! ```
//!
//! ## Modules
//!
//! - [`store`] - The [`Store`] facade
//! - [`iterator`] - [`RangeIterator`], shared by every adapter
//! - [`batch`] - [`WriteBatch`], atomic buffered writes
//! - [`backend`] / [`factory`] - Backend selection and opening stores
//! - [`metrics`] - Optional operation sink

pub mod backend;
pub mod batch;
pub mod config;
pub mod error;
pub mod factory;
pub mod iterator;
pub mod metrics;
pub mod store;

pub use backend::{Backend, BackendCursor, BackendKind, BackendWriteGroup};
pub use batch::WriteBatch;
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use factory::StoreFactory;
pub use iterator::RangeIterator;
pub use metrics::{MetricsSink, OperationSink, Outcome, SinkSnapshot};
pub use store::{Store, StoreIterator};

// Re-export the types callers need from the storage layer
pub use unikv_storage::{
    Direction, Durability, EngineCursor, EngineError, EngineStats, KeyRange, KeyValue, KvEngine,
};
