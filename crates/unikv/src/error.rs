//! Error types for the `unikv` store.

use thiserror::Error;

/// Errors that can occur when using a `unikv` store.
#[derive(Debug, Error)]
pub enum Error {
    /// A keyed operation or a range bound used a zero-length key.
    #[error("key cannot be empty")]
    KeyEmpty,

    /// The batch was already committed or discarded.
    #[error("batch is closed")]
    BatchClosed,

    /// An invalid or released iterator was read or advanced.
    ///
    /// This is never returned as a value; iterators panic with this message.
    #[error("iterator is invalid")]
    IteratorMisuse,

    /// The underlying engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] unikv_storage::EngineError),

    /// No backend is registered under the given name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// The store's directory could not be prepared.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reject zero-length keys.
pub(crate) fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        Err(Error::KeyEmpty)
    } else {
        Ok(())
    }
}
