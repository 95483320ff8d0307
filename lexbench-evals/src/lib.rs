//! Benchmark core for lexbench.
//!
//! This crate scores model answers on four legal-domain benchmarks and
//! makes runs resumable:
//!
//! - **Scoring** ([`scoring`]): exact match, token F1, instruction
//!   verifiers and multiple-choice letter extraction. Pure functions.
//! - **Benchmarks** ([`benchmark`]): the [`Benchmark`] trait and the
//!   LegalBench, CUAD, IFEval and MMLU-Pro implementations.
//! - **Checkpoints** ([`checkpoint`]): a durable map from [`TaskId`] to
//!   [`ResultRecord`], rewritten atomically on every commit.
//! - **Runner** ([`runner`]): drives one benchmark against one model.
//! - **Suite** ([`suite`]): loops over models and benchmarks, handles
//!   model lifecycle and keeps a [`ResultSink`] in step with the checkpoint.
//!
//! # Architecture
//!
//! ```text
//!   Suite ──▶ BenchmarkRunner ──▶ Benchmark ──▶ DatasetSource
//!                  │    │
//!                  │    └──────▶ ModelClient (lexbench-models)
//!                  ▼
//!          CheckpointStore ──▶ {run_id}.json
//!                  │
//!                  ▼
//!              ResultSink ──▶ results.csv / results.jsonl
//! ```
//!
//! Everything runs sequentially: one model call in flight at a time.

mod error;
mod types;

pub mod benchmark;
pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod record;
pub mod runner;
pub mod sampling;
pub mod scoring;
pub mod sink;
pub mod suite;
pub mod summary;

pub use error::{Error, Result};
pub use types::TaskId;

pub use benchmark::{Benchmark, BenchmarkRegistry, BenchmarkSources, Item};
pub use checkpoint::{CheckpointStore, RunInfo, list_runs, new_run_id};
pub use config::SuiteConfig;
pub use record::ResultRecord;
pub use runner::{BenchmarkRun, BenchmarkRunner, ModelUnderTest, RunOptions};
pub use sink::{CsvSink, JsonlSink, ResultSink, backfill};
pub use suite::{ClientSet, PairOutcome, Suite, SuiteOptions, SuiteReport};
pub use summary::Summary;
