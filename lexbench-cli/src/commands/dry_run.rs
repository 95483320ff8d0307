//! `lexbench dry-run`: check the environment without calling a real model.
//!
//! Each check prints one `[OK]` or `[FAIL]` line. The offline checks push a
//! canned LegalBench item through the real runner, checkpoint and sink code
//! inside a temporary directory.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use lexbench_evals::benchmark::LegalBench;
use lexbench_evals::dataset::{StaticLegalBench, TaskRow};
use lexbench_evals::{
    BenchmarkRun, BenchmarkRunner, CheckpointStore, CsvSink, JsonlSink, ModelUnderTest,
    ResultSink, RunOptions, SuiteConfig,
};
use lexbench_models::providers::{ChatOutcome, ChatRequest, ModelClient, OllamaClient};
use tempfile::TempDir;

use crate::config::LexbenchConfig;

/// Task and answer used by the offline checks.
const CANNED_TASK: &str = "hearsay";
const CANNED_ANSWER: &str = "Yes";

/// Always answers [`CANNED_ANSWER`].
struct CannedClient;

#[async_trait]
impl ModelClient for CannedClient {
    fn name(&self) -> &str {
        "canned"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn chat(&self, _request: ChatRequest) -> lexbench_models::Result<ChatOutcome> {
        Ok(ChatOutcome::text(CANNED_ANSWER))
    }
}

/// Outcome of one check.
struct Check {
    name: &'static str,
    result: Result<String>,
}

impl Check {
    fn print(&self) {
        match &self.result {
            Ok(detail) => println!("[OK]   {}: {}", self.name, detail),
            Err(e) => println!("[FAIL] {}: {:#}", self.name, e),
        }
    }
}

pub async fn run(config: LexbenchConfig) -> Result<()> {
    let suite_config = config.suite_config();
    let scratch = TempDir::new()?;

    let checks = vec![
        Check {
            name: "ollama",
            result: check_ollama(&config).await,
        },
        Check {
            name: "directories",
            result: check_dirs(&suite_config).await,
        },
        Check {
            name: "scoring",
            result: check_offline_item(&suite_config, &scratch).await.map(|run| {
                format!("{} canned item(s) scored {:.1}", run.records.len(), run.mean_score())
            }),
        },
        Check {
            name: "sinks",
            result: check_sinks(&suite_config, &scratch).await,
        },
    ];

    for check in &checks {
        check.print();
    }

    let failed = checks.iter().filter(|c| c.result.is_err()).count();
    if failed > 0 {
        bail!("{failed} check(s) failed");
    }
    println!();
    println!("All checks passed.");
    Ok(())
}

async fn check_ollama(config: &LexbenchConfig) -> Result<String> {
    let client = OllamaClient::new(config.ollama.clone())?;
    if client.is_available().await {
        Ok(format!("reachable at {}", client.base_url()))
    } else {
        Err(anyhow!("not reachable at {}", client.base_url()))
    }
}

async fn check_dirs(config: &SuiteConfig) -> Result<String> {
    config.ensure_dirs().await?;
    Ok(format!(
        "{} and {}",
        config.checkpoint_dir.display(),
        config.results_dir.display()
    ))
}

/// Suite configuration rooted in `scratch`, same seed and tables.
fn scratch_config(config: &SuiteConfig, scratch: &TempDir) -> SuiteConfig {
    SuiteConfig {
        seed: config.seed,
        legalbench_tasks: config.legalbench_tasks.clone(),
        ..SuiteConfig::with_data_root(scratch.path())
    }
}

async fn check_offline_item(config: &SuiteConfig, scratch: &TempDir) -> Result<BenchmarkRun> {
    let config = scratch_config(config, scratch);
    let source = StaticLegalBench::new().with_task(
        CANNED_TASK,
        vec![TaskRow::new(
            "Q: Was the statement offered to prove the truth of the matter asserted?",
            CANNED_ANSWER,
        )],
        None,
    );
    let bench = LegalBench::new(Arc::new(source), &config);
    let mut checkpoint = CheckpointStore::open(&config.checkpoint_dir, "dry-run").await?;
    let model = ModelUnderTest {
        name: "canned",
        tag: "canned",
    };

    let run = BenchmarkRunner::new(&config)
        .run(&bench, model, &CannedClient, &mut checkpoint, true, RunOptions::default())
        .await?;

    if run.records.is_empty() {
        bail!("no items sampled");
    }
    if run.mean_score() < 1.0 {
        bail!("canned answer scored {:.2}, expected 1.0", run.mean_score());
    }
    Ok(run)
}

async fn check_sinks(config: &SuiteConfig, scratch: &TempDir) -> Result<String> {
    // Reuses the checkpoint written by the scoring check.
    let config = scratch_config(config, scratch);
    let checkpoint = CheckpointStore::open(&config.checkpoint_dir, "dry-run").await?;
    let records = checkpoint.load_all();
    if records.is_empty() {
        bail!("nothing to write");
    }

    let csv = CsvSink::new(config.results_dir.join("dry-run.csv"));
    let jsonl = JsonlSink::new(config.results_dir.join("dry-run.jsonl"));
    for record in &records {
        csv.write(record).await?;
        jsonl.write(record).await?;
    }

    if csv.read_all().await? != records {
        bail!("CSV round trip changed the records");
    }
    if jsonl.read_all().await? != records {
        bail!("JSONL round trip changed the records");
    }
    Ok(format!("{} record(s) round-tripped through csv and jsonl", records.len()))
}
