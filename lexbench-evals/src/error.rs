//! Error types for the benchmark core.

use thiserror::Error;

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running benchmarks.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A dataset could not be fetched, cloned or parsed.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Benchmark name not present in the registry.
    #[error("unknown benchmark: {0}")]
    UnknownBenchmark(String),

    /// Error from a model client or the model registry.
    #[error(transparent)]
    Model(#[from] lexbench_models::Error),

    /// The checkpoint file could not be written.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// An item was handed to a benchmark that cannot interpret it.
    #[error("invalid item: {0}")]
    InvalidItem(String),
}

impl Error {
    /// Whether this wraps a transport failure from a model call.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Model(e) if e.is_transport())
    }
}
