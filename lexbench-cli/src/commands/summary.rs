//! Score tables for finished or partial runs.

use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use lexbench_evals::summary::Mean;
use lexbench_evals::{CheckpointStore, Summary, list_runs};

use crate::config::LexbenchConfig;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Run id to summarize (default: the latest run)
    pub run_id: Option<String>,

    /// Also show per-category scores
    #[arg(long)]
    pub categories: bool,
}

pub async fn run(args: SummaryArgs, config: LexbenchConfig) -> Result<()> {
    let dir = &config.paths.checkpoint_dir;
    let mut runs = list_runs(dir).await?;
    let run_id = match args.run_id {
        Some(id) if runs.iter().any(|r| r.run_id == id) => id,
        Some(id) => bail!("No checkpoint for run '{id}' in {}", dir.display()),
        None => match runs.pop() {
            Some(latest) => latest.run_id,
            None => bail!("No checkpoints in {}", dir.display()),
        },
    };

    let checkpoint = CheckpointStore::open(dir, &run_id).await?;
    let summary = Summary::from_records(&checkpoint.load_all());

    println!("Run {run_id}: {} task(s)", summary.task_count());
    println!();
    print_summary(&summary);

    if args.categories {
        print_categories("LegalBench", &summary.legalbench_categories);
        print_categories("CUAD (macro F1)", &summary.cuad_categories);
    }
    Ok(())
}

fn header(names: impl IntoIterator<Item = String>) -> Vec<Cell> {
    names
        .into_iter()
        .map(|name| Cell::new(name).fg(Color::Cyan))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn percent_cell(mean: Option<Mean>) -> Cell {
    let text = match mean.and_then(|m| m.percent()) {
        Some(pct) => format!("{pct:.1}%"),
        None => "-".to_string(),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn speed_cell(mean: Mean) -> Cell {
    let text = match mean.value() {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Model x benchmark score table plus throughput.
pub fn print_summary(summary: &Summary) {
    if summary.is_empty() {
        println!("No results yet.");
        return;
    }

    let mut table = new_table();
    let mut columns = vec!["Model".to_string()];
    columns.extend(summary.benchmarks.iter().cloned());
    columns.extend(["tok/s".to_string(), "tok/s (thinking)".to_string()]);
    table.set_header(header(columns));

    for model in &summary.models {
        let mut row = vec![Cell::new(model)];
        for bench in &summary.benchmarks {
            row.push(percent_cell(summary.score(model, bench)));
        }
        let speed = summary.throughput.get(model).copied().unwrap_or_default();
        row.push(speed_cell(speed.no_thinking));
        row.push(speed_cell(speed.thinking));
        table.add_row(row);
    }

    println!("{table}");
}

fn print_categories(title: &str, rows: &std::collections::BTreeMap<(String, String), Mean>) {
    if rows.is_empty() {
        return;
    }
    println!();
    println!("{title}");

    let mut table = new_table();
    table.set_header(header(["Model", "Category", "Score", "Tasks"].map(String::from)));
    for ((model, category), mean) in rows {
        table.add_row(vec![
            Cell::new(model),
            Cell::new(category),
            percent_cell(Some(*mean)),
            Cell::new(mean.count).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}
