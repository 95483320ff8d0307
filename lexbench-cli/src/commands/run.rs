//! `lexbench run`: benchmark models and write results.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use lexbench_evals::{
    BenchmarkRegistry, BenchmarkSources, CheckpointStore, ClientSet, CsvSink, JsonlSink,
    ResultSink, Suite, SuiteOptions, Summary, new_run_id,
};
use lexbench_models::auth::CredentialStore;
use lexbench_models::providers::{AnthropicClient, ModelClient, OllamaClient};
use lexbench_models::{ModelRegistry, ProviderKind};
use tracing::{info, warn};

use crate::commands::summary::print_summary;
use crate::config::{LexbenchConfig, OutputFormat};

/// Credential store service name.
pub const CREDENTIAL_SERVICE: &str = "lexbench";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Models to run, comma separated (default: every local model)
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Benchmarks to run, comma separated
    #[arg(long, value_delimiter = ',')]
    pub benchmarks: Vec<String>,

    /// Use the reduced sample sizes
    #[arg(long)]
    pub quick: bool,

    /// Resume an existing run instead of starting a new one
    #[arg(long)]
    pub run_id: Option<String>,

    /// Do not pull local models before running them
    #[arg(long)]
    pub skip_prepare: bool,

    /// Result file format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Generation cap per call
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

pub async fn run(args: RunArgs, config: LexbenchConfig) -> Result<()> {
    let registry = config.model_registry();
    let models = pick_models(&args.models, &config.run.models, &registry);
    let benchmarks = if args.benchmarks.is_empty() {
        config.run.benchmarks.clone()
    } else {
        args.benchmarks.clone()
    };
    if models.is_empty() {
        bail!("No models selected. Pass --models or register local models in config.");
    }
    registry.validate(&models)?;
    BenchmarkRegistry::with_defaults().validate(&benchmarks)?;

    let suite_config = config.suite_config();
    suite_config
        .ensure_dirs()
        .await
        .context("creating output directories")?;

    let run_id = args.run_id.clone().unwrap_or_else(new_run_id);
    let mut checkpoint = CheckpointStore::open(&suite_config.checkpoint_dir, &run_id).await?;

    let format = args.format.unwrap_or(config.run.output);
    let sink_path = suite_config
        .results_dir
        .join(format!("{run_id}.{}", format.extension()));
    let sink: Box<dyn ResultSink> = match format {
        OutputFormat::Csv => Box::new(CsvSink::new(&sink_path)),
        OutputFormat::Jsonl => Box::new(JsonlSink::new(&sink_path)),
    };

    if checkpoint.count() > 0 {
        info!(run_id = %run_id, done = checkpoint.count(), "Resuming run");
    }

    let options = SuiteOptions {
        quick: args.quick,
        skip_prepare: args.skip_prepare || config.run.skip_prepare,
        max_tokens: args.max_tokens.or(config.run.max_tokens),
    };
    let clients = build_clients(&config, &registry, &models)?;
    let sources = BenchmarkSources::from_config(&suite_config)?;

    let suite = Suite::new(&suite_config, &registry, sources, clients, options);
    let report = suite
        .run(&models, &benchmarks, &mut checkpoint, sink.as_ref())
        .await?;

    println!();
    println!("Run id:     {run_id}");
    println!("Checkpoint: {}", checkpoint.path().display());
    println!("Results:    {}", sink.path().display());
    if !report.skipped_models.is_empty() {
        println!("Skipped:    {}", report.skipped_models.join(", "));
    }
    if report.failed_items() > 0 {
        println!(
            "{} item(s) failed and will be retried with --run-id {run_id}",
            report.failed_items()
        );
    }
    println!();

    print_summary(&Summary::from_records(&checkpoint.load_all()));
    Ok(())
}

/// Command line first, then config, then every local model.
fn pick_models(cli: &[String], configured: &[String], registry: &ModelRegistry) -> Vec<String> {
    if !cli.is_empty() {
        cli.to_vec()
    } else if !configured.is_empty() {
        configured.to_vec()
    } else {
        registry.local_names()
    }
}

fn build_clients(
    config: &LexbenchConfig,
    registry: &ModelRegistry,
    models: &[String],
) -> Result<ClientSet> {
    let providers: Vec<ProviderKind> = models
        .iter()
        .filter_map(|name| registry.get(name).ok().map(|entry| entry.provider))
        .collect();

    let mut clients = ClientSet::default();
    if providers.contains(&ProviderKind::Ollama) {
        let ollama = OllamaClient::new(config.ollama.clone())?;
        clients.ollama = Some(Arc::new(ollama) as Arc<dyn ModelClient>);
    }
    if providers.contains(&ProviderKind::Anthropic) {
        let store = CredentialStore::new(CREDENTIAL_SERVICE).with_env_fallback();
        let key = match store.get(ProviderKind::Anthropic) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "No Anthropic key; run `lexbench models auth anthropic`");
                None
            }
        };
        let mut anthropic =
            AnthropicClient::new(key, Duration::from_secs(config.anthropic.timeout_secs))?;
        if let Some(url) = &config.anthropic.base_url {
            anthropic = anthropic.with_base_url(url);
        }
        clients.anthropic = Some(Arc::new(anthropic) as Arc<dyn ModelClient>);
    }
    Ok(clients)
}
