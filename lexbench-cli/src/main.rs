use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod config;

use config::{ConfigLoader, LexbenchConfig};

#[derive(Parser)]
#[command(name = "lexbench", about = "Legal-domain LLM benchmark harness")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmarks against models
    Run(commands::run::RunArgs),
    /// Check the environment without calling a model
    DryRun,
    /// List models and manage API keys
    Models(commands::models::ModelsArgs),
    /// List resumable runs
    Checkpoints,
    /// Show scores for a run
    Summary(commands::summary::SummaryArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

/// Console logging on stderr plus, when enabled, a daily log file.
///
/// `RUST_LOG` overrides the level picked by `--verbose`. The returned guard
/// flushes the file writer on drop.
fn init_logging(verbose: bool, config: &LexbenchConfig) -> Option<WorkerGuard> {
    let level = if verbose { "debug" } else { "info" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = if config.run.log_to_file
        && std::fs::create_dir_all(&config.paths.logs_dir).is_ok()
    {
        let appender = tracing_appender::rolling::daily(&config.paths.logs_dir, "lexbench.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter());
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load()?;
    let _log_guard = init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Run(args) => commands::run::run(args, config).await,
        Commands::DryRun => commands::dry_run::run(config).await,
        Commands::Models(args) => commands::models::run(args, config).await,
        Commands::Checkpoints => commands::checkpoints::run(config).await,
        Commands::Summary(args) => commands::summary::run(args, config).await,
        Commands::Config(args) => commands::config::run(args, config),
    }
}
