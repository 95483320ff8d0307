//! Runs a selection of benchmarks against a selection of models.
//!
//! ```text
//! validate names ─▶ backfill sink ─▶ for each model:
//!                     health check ─▶ prepare ─▶ for each benchmark:
//!                                                  ensure dataset ─▶ run (checkpoint + sink per item)
//!                     release (local models)
//! ```
//!
//! The sink is first topped up with checkpointed records it does not hold,
//! so a run resumed after a crash or an aborted benchmark leaves a complete
//! results file without duplicates.
//!
//! Unknown names abort before any model is called. A model that fails its
//! health check or cannot be prepared is skipped; a benchmark whose dataset
//! cannot be prepared is skipped for that model only.

use std::sync::Arc;

use lexbench_models::providers::ModelClient;
use lexbench_models::{ModelRegistry, ProviderKind};
use tracing::{error, info, warn};

use crate::benchmark::{Benchmark, BenchmarkRegistry, BenchmarkSources};
use crate::checkpoint::CheckpointStore;
use crate::config::SuiteConfig;
use crate::record::ResultRecord;
use crate::runner::{BenchmarkRun, BenchmarkRunner, ModelUnderTest, RunOptions};
use crate::sink::{ResultSink, backfill};
use crate::{Error, Result};

/// Switches for a suite run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteOptions {
    /// Use the quick sample sizes.
    pub quick: bool,
    /// Do not pull models before running them.
    pub skip_prepare: bool,
    /// Generation cap passed to every call.
    pub max_tokens: Option<u32>,
}

/// One client per provider.
#[derive(Clone, Default)]
pub struct ClientSet {
    pub ollama: Option<Arc<dyn ModelClient>>,
    pub anthropic: Option<Arc<dyn ModelClient>>,
}

impl ClientSet {
    pub fn for_provider(&self, provider: ProviderKind) -> Option<&dyn ModelClient> {
        match provider {
            ProviderKind::Ollama => self.ollama.as_deref(),
            ProviderKind::Anthropic => self.anthropic.as_deref(),
        }
    }
}

/// What happened to one (model, benchmark) pair.
#[derive(Debug, Clone)]
pub enum PairOutcome {
    Completed(BenchmarkRun),
    /// Dataset or benchmark failure; the reason is logged.
    Skipped(String),
}

/// Everything a suite run produced.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    /// (model, benchmark, outcome) in execution order.
    pub pairs: Vec<(String, String, PairOutcome)>,
    /// Models that were unreachable or could not be prepared.
    pub skipped_models: Vec<String>,
}

impl SuiteReport {
    /// Every record of every completed pair.
    pub fn records(&self) -> Vec<ResultRecord> {
        self.pairs
            .iter()
            .filter_map(|(_, _, outcome)| match outcome {
                PairOutcome::Completed(run) => Some(run.records.iter().cloned()),
                PairOutcome::Skipped(_) => None,
            })
            .flatten()
            .collect()
    }

    /// Items skipped after transport failures, across all pairs.
    pub fn failed_items(&self) -> usize {
        self.pairs
            .iter()
            .map(|(_, _, outcome)| match outcome {
                PairOutcome::Completed(run) => run.failed,
                PairOutcome::Skipped(_) => 0,
            })
            .sum()
    }
}

pub struct Suite<'a> {
    config: &'a SuiteConfig,
    models: &'a ModelRegistry,
    benchmarks: BenchmarkRegistry,
    sources: BenchmarkSources,
    clients: ClientSet,
    options: SuiteOptions,
}

impl<'a> Suite<'a> {
    pub fn new(
        config: &'a SuiteConfig,
        models: &'a ModelRegistry,
        sources: BenchmarkSources,
        clients: ClientSet,
        options: SuiteOptions,
    ) -> Self {
        Self {
            config,
            models,
            benchmarks: BenchmarkRegistry::with_defaults(),
            sources,
            clients,
            options,
        }
    }

    /// Replace the benchmark registry.
    pub fn with_benchmarks(mut self, benchmarks: BenchmarkRegistry) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    /// Run every benchmark in `benchmarks` against every model in `models`.
    ///
    /// # Errors
    ///
    /// Unknown model or benchmark names, a benchmark that cannot be built,
    /// and checkpoint or sink write failures abort the run.
    pub async fn run<M, B>(
        &self,
        models: &[M],
        benchmarks: &[B],
        checkpoint: &mut CheckpointStore,
        sink: &dyn ResultSink,
    ) -> Result<SuiteReport>
    where
        M: AsRef<str>,
        B: AsRef<str>,
    {
        self.models.validate(models)?;
        self.benchmarks.validate(benchmarks)?;
        let built: Vec<Box<dyn Benchmark>> = benchmarks
            .iter()
            .map(|name| self.benchmarks.create(name.as_ref(), self.config, &self.sources))
            .collect::<Result<_>>()?;

        info!(
            models = models.len(),
            benchmarks = built.len(),
            quick = self.options.quick,
            checkpoint = %checkpoint.path().display(),
            sink = %sink.path().display(),
            "Starting suite"
        );

        backfill(checkpoint, sink).await?;
        let runner = BenchmarkRunner::new(self.config).with_sink(sink);
        let mut report = SuiteReport::default();

        for model_name in models {
            let model_name = model_name.as_ref();
            let entry = self.models.get(model_name)?;
            let Some(client) = self.clients.for_provider(entry.provider) else {
                warn!(model = model_name, provider = %entry.provider, "No client for provider, skipping model");
                report.skipped_models.push(model_name.to_string());
                continue;
            };

            if !client.is_available().await {
                warn!(model = model_name, provider = %entry.provider, "Backend unavailable, skipping model");
                report.skipped_models.push(model_name.to_string());
                continue;
            }
            if !self.options.skip_prepare {
                if let Err(e) = client.prepare(&entry.tag).await {
                    warn!(model = model_name, error = %e, "Could not prepare model, skipping");
                    report.skipped_models.push(model_name.to_string());
                    continue;
                }
            }

            let model = ModelUnderTest {
                name: model_name,
                tag: &entry.tag,
            };
            let options = RunOptions {
                thinking: entry.thinking,
                max_tokens: self.options.max_tokens,
            };

            for benchmark in &built {
                let outcome = self
                    .run_pair(&runner, benchmark.as_ref(), model, client, checkpoint, options)
                    .await;
                let outcome = match outcome {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        if entry.provider.is_local() {
                            client.release(&entry.tag).await;
                        }
                        return Err(e);
                    }
                };
                report
                    .pairs
                    .push((model_name.to_string(), benchmark.name().to_string(), outcome));
            }

            if entry.provider.is_local() {
                client.release(&entry.tag).await;
            }
        }

        info!(
            records = report.records().len(),
            failed_items = report.failed_items(),
            skipped_models = report.skipped_models.len(),
            "Suite finished"
        );
        Ok(report)
    }

    async fn run_pair(
        &self,
        runner: &BenchmarkRunner<'_>,
        benchmark: &dyn Benchmark,
        model: ModelUnderTest<'_>,
        client: &dyn ModelClient,
        checkpoint: &mut CheckpointStore,
        options: RunOptions,
    ) -> Result<PairOutcome> {
        if let Err(e) = benchmark.ensure_dataset_available().await {
            warn!(benchmark = benchmark.name(), model = model.name, error = %e, "Dataset unavailable, skipping benchmark");
            return Ok(PairOutcome::Skipped(e.to_string()));
        }

        match runner
            .run(benchmark, model, client, checkpoint, self.options.quick, options)
            .await
        {
            Ok(run) => Ok(PairOutcome::Completed(run)),
            Err(e @ (Error::Checkpoint(_) | Error::Io(_) | Error::Csv(_))) => Err(e),
            Err(e) => {
                error!(benchmark = benchmark.name(), model = model.name, error = %e, "Benchmark aborted");
                Ok(PairOutcome::Skipped(e.to_string()))
            }
        }
    }
}
