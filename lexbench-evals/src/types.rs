//! Core identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one (benchmark, model, item) unit of work.
///
/// Rendered as `benchmark::model::index`; stable as long as the sample is
/// stable, which is what makes checkpoints resumable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Build the id for an item of a benchmark run against a model.
    #[must_use]
    pub fn new(benchmark: &str, model: &str, index: usize) -> Self {
        Self(format!("{benchmark}::{model}::{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
