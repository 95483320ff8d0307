//! Drives one benchmark against one model.
//!
//! The loop is strictly sequential: one model call in flight at a time.
//! Every completed item is committed to the checkpoint before the next one
//! starts, then handed to the result sink when one is attached. Killing the
//! process loses at most the item in flight, and a second run with the same
//! run id only asks the model about items that are not yet done.

use lexbench_models::providers::{ChatRequest, ModelClient};
use tracing::{debug, info, warn};

use crate::benchmark::{Benchmark, Item};
use crate::checkpoint::CheckpointStore;
use crate::config::SuiteConfig;
use crate::record::{RecordText, RecordTiming, ResultRecord};
use crate::sink::ResultSink;
use crate::types::TaskId;
use crate::{Error, Result};

/// Per-call options forwarded to the model client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Ask the model for hidden reasoning.
    pub thinking: bool,
    /// Generation cap; the client default when `None`.
    pub max_tokens: Option<u32>,
}

/// Result of driving one (benchmark, model) pair.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRun {
    /// Checkpointed records first, then the ones produced by this call.
    pub records: Vec<ResultRecord>,
    /// How many leading entries of `records` came from the checkpoint.
    pub resumed: usize,
    /// Items skipped after a transport failure; eligible on the next run.
    pub failed: usize,
}

impl BenchmarkRun {
    /// Records produced by this call.
    pub fn new_records(&self) -> &[ResultRecord] {
        &self.records[self.resumed..]
    }

    /// Mean score over every record, 0 when empty.
    pub fn mean_score(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(|r| r.score).sum::<f64>() / self.records.len() as f64
    }
}

/// Identifies the model under test.
#[derive(Debug, Clone, Copy)]
pub struct ModelUnderTest<'a> {
    /// Registry name, used in task ids and records.
    pub name: &'a str,
    /// Backend identifier sent to the client.
    pub tag: &'a str,
}

/// Runs benchmarks with a shared configuration.
pub struct BenchmarkRunner<'a> {
    config: &'a SuiteConfig,
    sink: Option<&'a dyn ResultSink>,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(config: &'a SuiteConfig) -> Self {
        Self { config, sink: None }
    }

    /// Append every new record to `sink` right after it is checkpointed.
    pub fn with_sink(mut self, sink: &'a dyn ResultSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run `benchmark` against `model`, skipping items already in
    /// `checkpoint`.
    ///
    /// Transport failures skip the item. Any other model error aborts the
    /// benchmark, as does a failed checkpoint or sink write. Records
    /// committed before an abort are already in the checkpoint and sink.
    pub async fn run(
        &self,
        benchmark: &dyn Benchmark,
        model: ModelUnderTest<'_>,
        client: &dyn ModelClient,
        checkpoint: &mut CheckpointStore,
        quick: bool,
        options: RunOptions,
    ) -> Result<BenchmarkRun> {
        let bench_name = benchmark.name();
        let count = self.config.sample_size(bench_name, quick);
        let items = benchmark.load_sample(count, quick).await?;

        let mut run = BenchmarkRun {
            records: checkpoint.records_for(bench_name, model.name),
            ..Default::default()
        };
        run.resumed = run.records.len();

        let total = items.len();
        info!(
            benchmark = bench_name,
            model = model.name,
            items = total,
            resumed = run.resumed,
            quick,
            "Starting benchmark"
        );

        for (pos, item) in items.iter().enumerate() {
            let task_id = TaskId::new(bench_name, model.name, item.index);
            if checkpoint.is_done(&task_id) {
                debug!(task_id = %task_id, "Already done, skipping");
                continue;
            }

            let Some(record) = self
                .run_item(benchmark, model, client, item, &task_id, options)
                .await?
            else {
                run.failed += 1;
                continue;
            };

            checkpoint.mark_done(&task_id, record.clone()).await?;
            if let Some(sink) = self.sink {
                sink.write(&record).await?;
            }
            info!(
                benchmark = bench_name,
                model = model.name,
                progress = %format!("{}/{}", pos + 1, total),
                category = %record.category,
                score = record.score,
                time_ms = record.latency_ms,
                tok_s = record.tokens_per_second,
                "Task completed"
            );
            run.records.push(record);
        }

        info!(
            benchmark = bench_name,
            model = model.name,
            records = run.records.len(),
            new = run.records.len() - run.resumed,
            failed = run.failed,
            mean_score = %format!("{:.3}", run.mean_score()),
            "Benchmark finished"
        );
        Ok(run)
    }

    /// Prompt, call and score one item. `None` when the item is skipped.
    async fn run_item(
        &self,
        benchmark: &dyn Benchmark,
        model: ModelUnderTest<'_>,
        client: &dyn ModelClient,
        item: &Item,
        task_id: &TaskId,
        options: RunOptions,
    ) -> Result<Option<ResultRecord>> {
        let prompt = match benchmark.build_prompt(item) {
            Ok(prompt) => prompt,
            Err(Error::InvalidItem(reason)) => {
                warn!(task_id = %task_id, reason = %reason, "Skipping item");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut request = ChatRequest::single_turn(model.tag, prompt.clone()).thinking(options.thinking);
        if let Some(max) = options.max_tokens {
            request = request.max_tokens(max);
        }

        let outcome = match client.chat(request).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_transport() => {
                warn!(task_id = %task_id, error = %e, "Model call failed, skipping item");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let score = match benchmark.evaluate(&outcome.text, item) {
            Ok(score) => score,
            Err(Error::InvalidItem(reason)) => {
                warn!(task_id = %task_id, reason = %reason, "Skipping item");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if let Some(details) = benchmark.details(&outcome.text, item) {
            debug!(task_id = %task_id, details = %details, "Scoring details");
        }

        Ok(Some(ResultRecord::new(
            model.name,
            benchmark.name(),
            task_id.clone(),
            score,
            RecordText {
                category: item.category.clone(),
                prompt,
                response: outcome.text,
                ground_truth: item.ground_truth(),
            },
            RecordTiming {
                latency_ms: outcome.elapsed_ms,
                tokens_generated: outcome.tokens_generated,
                tokens_per_second: outcome.tokens_per_second,
                thinking_tokens: outcome.thinking_tokens,
            },
            &self.config.truncation,
        )))
    }
}
