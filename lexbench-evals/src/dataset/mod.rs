//! Dataset sources.
//!
//! Benchmarks never fetch data themselves; they are handed a source at
//! construction. [`DatasetSource`] yields raw JSON rows for the Hugging Face
//! benchmarks, [`LegalBenchSource`] yields per-task tables and prompt
//! preambles from the LegalBench repository.

mod hub;
mod legalbench;
mod local;

use async_trait::async_trait;
use serde_json::Value;

pub use hub::HubDataset;
pub use legalbench::{LegalBenchRepo, LegalBenchSource, StaticLegalBench, TaskRow};
pub use local::{JsonlDataset, StaticDataset};

use crate::Result;

/// A source of raw dataset rows.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Human-readable name for logs.
    fn describe(&self) -> String;

    /// Fetch the data if it is not available locally. Idempotent.
    async fn ensure_available(&self) -> Result<()>;

    /// All rows, in dataset order.
    async fn records(&self) -> Result<Vec<Value>>;
}
