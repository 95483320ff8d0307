use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use lexbench_evals::{CheckpointStore, list_runs};

use crate::config::LexbenchConfig;

/// List run ids that can be resumed with `lexbench run --run-id`.
pub async fn run(config: LexbenchConfig) -> Result<()> {
    let dir = &config.paths.checkpoint_dir;
    let runs = list_runs(dir).await?;

    if runs.is_empty() {
        println!("No checkpoints in {}", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Run id").fg(Color::Cyan),
        Cell::new("Tasks").fg(Color::Cyan),
        Cell::new("Path").fg(Color::Cyan),
    ]);

    for info in runs {
        let tasks = match CheckpointStore::open(dir, &info.run_id).await {
            Ok(store) => store.count().to_string(),
            Err(e) => format!("unreadable: {e}"),
        };
        table.add_row(vec![
            Cell::new(&info.run_id),
            Cell::new(tasks).set_alignment(CellAlignment::Right),
            Cell::new(info.path.display()),
        ]);
    }

    println!("{table}");
    Ok(())
}
