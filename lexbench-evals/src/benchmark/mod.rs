//! Benchmark trait and the concrete benchmarks.
//!
//! A [`Benchmark`] prepares its dataset, draws a reproducible sample of
//! [`Item`]s, turns an item into a prompt and scores a response. It knows
//! nothing about models, checkpoints or output; the
//! [`BenchmarkRunner`](crate::runner::BenchmarkRunner) drives it.
//!
//! # Example
//!
//! ```ignore
//! use lexbench_evals::benchmark::{BenchmarkRegistry, BenchmarkSources};
//!
//! let sources = BenchmarkSources::from_config(&config)?;
//! let bench = BenchmarkRegistry::with_defaults().create("mmlupro", &config, &sources)?;
//! bench.ensure_dataset_available().await?;
//! let items = bench.load_sample(20, true).await?;
//! let prompt = bench.build_prompt(&items[0])?;
//! ```

mod cuad;
mod ifeval;
mod legalbench;
mod mmlupro;
mod registry;

use std::sync::Arc;

use async_trait::async_trait;

pub use cuad::{Cuad, CuadItem, GroundTruth, NO_CLAUSE_PRESENT};
pub use ifeval::{IfEval, IfEvalItem};
pub use legalbench::{LegalBench, LegalBenchItem};
pub use mmlupro::{MmluPro, MmluProItem};
pub use registry::{BENCHMARK_NAMES, BenchmarkRegistry};

use crate::config::SuiteConfig;
use crate::dataset::{DatasetSource, HubDataset, LegalBenchRepo, LegalBenchSource};
use crate::{Error, Result};

/// One sampled unit of a benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Position used to build the task id; stable for a fixed seed.
    pub index: usize,
    /// Reporting category (LegalBench category, CUAD clause type, ...).
    pub category: String,
    pub body: ItemBody,
}

/// Benchmark-specific item content.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemBody {
    LegalBench(LegalBenchItem),
    Cuad(CuadItem),
    IfEval(IfEvalItem),
    MmluPro(MmluProItem),
}

impl ItemBody {
    fn kind(&self) -> &'static str {
        match self {
            Self::LegalBench(_) => "legalbench",
            Self::Cuad(_) => "cuad",
            Self::IfEval(_) => "ifeval",
            Self::MmluPro(_) => "mmlupro",
        }
    }
}

impl Item {
    /// Ground truth as stored in result records.
    pub fn ground_truth(&self) -> String {
        match &self.body {
            ItemBody::LegalBench(i) => i.answer.clone(),
            ItemBody::Cuad(i) => i.answer.to_string(),
            ItemBody::IfEval(i) => i
                .instructions
                .iter()
                .map(|ins| ins.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            ItemBody::MmluPro(i) => i.answer.to_string(),
        }
    }

    pub(crate) fn mismatch(&self, benchmark: &str) -> Error {
        Error::InvalidItem(format!(
            "{benchmark} cannot handle a {} item (index {})",
            self.body.kind(),
            self.index
        ))
    }
}

/// The capability set every benchmark implements.
#[async_trait]
pub trait Benchmark: Send + Sync {
    /// Short name used in task ids and reports.
    fn name(&self) -> &str;

    /// Make the dataset available locally. Idempotent.
    async fn ensure_dataset_available(&self) -> Result<()>;

    /// Draw `count` items (fewer, with a warning, if the data runs short).
    ///
    /// Items carry stable indexes, and the same seed and dataset snapshot
    /// give the same items.
    async fn load_sample(&self, count: usize, quick: bool) -> Result<Vec<Item>>;

    /// Prompt text for `item`. Deterministic.
    fn build_prompt(&self, item: &Item) -> Result<String>;

    /// Score `prediction` for `item`, in `[0.0, 1.0]`.
    fn evaluate(&self, prediction: &str, item: &Item) -> Result<f64>;

    /// Extra per-item diagnostics for debug logs.
    fn details(&self, _prediction: &str, _item: &Item) -> Option<String> {
        None
    }
}

/// Dataset sources handed to benchmark constructors.
#[derive(Clone)]
pub struct BenchmarkSources {
    pub legalbench: Arc<dyn LegalBenchSource>,
    pub cuad: Arc<dyn DatasetSource>,
    pub ifeval: Arc<dyn DatasetSource>,
    pub mmlupro: Arc<dyn DatasetSource>,
}

impl BenchmarkSources {
    /// Network-backed sources cached under `config.datasets_dir`.
    pub fn from_config(config: &SuiteConfig) -> Result<Self> {
        let ids = &config.datasets;
        let dir = &config.datasets_dir;
        Ok(Self {
            legalbench: Arc::new(LegalBenchRepo::new(&ids.legalbench_repo, dir)),
            cuad: Arc::new(HubDataset::new(
                &ids.hub_endpoint,
                &ids.cuad,
                ids.cuad_splits.clone(),
                dir,
            )?),
            ifeval: Arc::new(HubDataset::new(
                &ids.hub_endpoint,
                &ids.ifeval,
                vec![ids.ifeval_split.clone()],
                dir,
            )?),
            mmlupro: Arc::new(
                HubDataset::new(
                    &ids.hub_endpoint,
                    &ids.mmlupro,
                    vec![ids.mmlupro_split.clone()],
                    dir,
                )?
                .with_filter(ids.mmlupro_filter.clone()),
            ),
        })
    }
}

/// String field of a raw dataset row; empty when missing.
pub(crate) fn row_str<'a>(row: &'a serde_json::Value, key: &str) -> &'a str {
    row.get(key).and_then(|v| v.as_str()).unwrap_or("")
}
