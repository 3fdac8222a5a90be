//! Storage error types.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A shared, thread-safe error produced by an underlying engine.
///
/// Errors are reference counted so that a failure latched by a cursor can be
/// reported again after the cursor has been released.
pub type DynError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by an engine adapter.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine could not be opened.
    #[error("failed to open engine: {0}")]
    Open(String),

    /// The engine failed while executing an operation.
    #[error("{context}: {source}")]
    Backend {
        /// The operation and key the failure is attributed to.
        context: ErrorContext,
        /// The engine's own error.
        #[source]
        source: DynError,
    },
}

impl EngineError {
    /// Wrap an engine error with the operation that produced it.
    pub fn backend(
        context: ErrorContext,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend { context, source: Arc::from(source.into()) }
    }

    /// The context attached to a backend failure, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Backend { context, .. } => Some(context),
            Self::Open(_) => None,
        }
    }
}

/// Operation and key information attached to an engine failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed.
    pub operation: &'static str,
    /// The key involved, if any.
    pub key: Option<Vec<u8>>,
}

impl ErrorContext {
    /// Context for an operation that is not tied to a single key.
    #[must_use]
    pub const fn new(operation: &'static str) -> Self {
        Self { operation, key: None }
    }

    /// Attach the key the operation was working on.
    #[must_use]
    pub fn with_key(mut self, key: &[u8]) -> Self {
        self.key = Some(key.to_vec());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.operation)?;
        if let Some(key) = &self.key {
            write!(f, " (key=")?;
            for byte in key {
                write!(f, "{byte:02x}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
