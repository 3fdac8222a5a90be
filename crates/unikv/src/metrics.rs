//! Observability for store operations.
//!
//! A store can report every operation to an [`OperationSink`] as a
//! `(store, operation, duration, outcome)` event, where `store` is the name
//! the store was opened under. Sinks are a side channel: they
//! never change what an operation returns.
//!
//! # Integration with `metrics` crate
//!
//! [`MetricsSink`] forwards events to the [`metrics`] crate facade, so any
//! installed recorder (for example `metrics-exporter-prometheus`) exports
//! them. It also keeps atomic totals for a cheap in-process snapshot.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use unikv::{BackendKind, MetricsSink, StoreConfig, StoreFactory};
//!
//! let sink = Arc::new(MetricsSink::new());
//! let factory = StoreFactory::new(StoreConfig::default()).with_sink(sink.clone());
//! let store = factory.open_in_memory(BackendKind::Redb)?;
//! store.set(b"k", b"v")?;
//! println!("operations: {}", sink.snapshot().operations);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// Re-export the metrics crate for integration
pub use ::metrics;

/// How an observed operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation returned `Ok`.
    Success,
    /// The operation returned an error.
    Failure,
}

impl Outcome {
    /// The outcome of a result.
    pub const fn of<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(_) => Self::Failure,
        }
    }

    /// A stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Receives one event per observed store operation.
///
/// One sink may be shared by many stores; `store` tells their events apart.
pub trait OperationSink: Send + Sync {
    /// Record an operation of the store named `store`.
    fn record(&self, store: &str, operation: &'static str, duration: Duration, outcome: Outcome);
}

/// Time `f` and report it to `sink`, if one is installed.
pub(crate) fn observe<T, E>(
    sink: Option<&dyn OperationSink>,
    store: &str,
    operation: &'static str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let Some(sink) = sink else {
        return f();
    };
    let start = Instant::now();
    let result = f();
    sink.record(store, operation, start.elapsed(), Outcome::of(&result));
    result
}

/// A sink that forwards events to the `metrics` crate.
#[derive(Debug, Default)]
pub struct MetricsSink {
    operations: AtomicU64,
    failures: AtomicU64,
}

impl MetricsSink {
    /// Create a new sink with zeroed totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a point-in-time snapshot of the totals.
    #[must_use]
    pub fn snapshot(&self) -> SinkSnapshot {
        SinkSnapshot {
            operations: self.operations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl OperationSink for MetricsSink {
    fn record(&self, store: &str, operation: &'static str, duration: Duration, outcome: Outcome) {
        self.operations.fetch_add(1, Ordering::Relaxed);

        ::metrics::histogram!(
            "unikv_operation_duration_seconds",
            "store" => store.to_owned(),
            "operation" => operation
        )
        .record(duration.as_secs_f64());
        ::metrics::counter!(
            "unikv_operations_total",
            "store" => store.to_owned(),
            "operation" => operation,
            "outcome" => outcome.as_str()
        )
        .increment(1);
        if outcome == Outcome::Failure {
            self.failures.fetch_add(1, Ordering::Relaxed);
            ::metrics::counter!(
                "unikv_operation_errors_total",
                "store" => store.to_owned(),
                "operation" => operation
            )
            .increment(1);
        }
    }
}

/// Totals recorded by a [`MetricsSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSnapshot {
    /// Operations observed.
    pub operations: u64,
    /// Operations that failed.
    pub failures: u64,
}

impl SinkSnapshot {
    /// Fraction of operations that failed, if any were observed.
    #[must_use]
    pub fn failure_rate(&self) -> Option<f64> {
        (self.operations > 0).then(|| self.failures as f64 / self.operations as f64)
    }
}
