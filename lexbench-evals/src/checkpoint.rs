//! Durable record of completed tasks.
//!
//! One JSON file per run id, `{checkpoint_dir}/{run_id}.json`, holding
//! `{"tasks": {"<task_id>": <record>, ...}}` in commit order. Every commit
//! rewrites the whole file through a temp file and a rename, so a crash never
//! leaves a half-written checkpoint behind. One writer per run id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::record::ResultRecord;
use crate::types::TaskId;
use crate::{Error, Result};

const CHECKPOINT_EXT: &str = "json";

/// File-backed map from task id to result record.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    entries: Vec<(TaskId, ResultRecord)>,
    index: HashMap<TaskId, usize>,
}

impl CheckpointStore {
    /// Open the checkpoint for `run_id`, creating the directory if needed.
    ///
    /// A missing file gives an empty store. An unreadable or malformed file
    /// is logged and replaced by an empty store on the next commit.
    pub async fn open(dir: impl AsRef<Path>, run_id: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{run_id}.{CHECKPOINT_EXT}"));

        let mut store = Self {
            path,
            entries: Vec::new(),
            index: HashMap::new(),
        };

        match fs::read_to_string(&store.path).await {
            Ok(content) => store.load(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %store.path.display(), "No checkpoint file, starting fresh");
            }
            Err(e) => {
                warn!(path = %store.path.display(), error = %e, "Could not read checkpoint, starting fresh");
            }
        }

        Ok(store)
    }

    fn load(&mut self, content: &str) {
        let tasks = match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(mut root)) => match root.remove("tasks") {
                Some(Value::Object(tasks)) => tasks,
                _ => {
                    warn!(path = %self.path.display(), "Checkpoint has no task map, starting fresh");
                    return;
                }
            },
            Ok(_) => {
                warn!(path = %self.path.display(), "Checkpoint is not an object, starting fresh");
                return;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt checkpoint, starting fresh");
                return;
            }
        };

        for (id, value) in tasks {
            match serde_json::from_value::<ResultRecord>(value) {
                Ok(record) => self.insert(TaskId::from(id), record),
                Err(e) => warn!(task_id = %id, error = %e, "Dropping unreadable checkpoint entry"),
            }
        }
        info!(
            tasks = self.entries.len(),
            path = %self.path.display(),
            "Checkpoint loaded"
        );
    }

    fn insert(&mut self, task_id: TaskId, record: ResultRecord) {
        if let Some(&pos) = self.index.get(&task_id) {
            self.entries[pos].1 = record;
        } else {
            self.index.insert(task_id.clone(), self.entries.len());
            self.entries.push((task_id, record));
        }
    }

    /// Whether `task_id` has been committed.
    pub fn is_done(&self, task_id: &TaskId) -> bool {
        self.index.contains_key(task_id)
    }

    /// Commit `record` under `task_id`. The record is on disk when this
    /// returns `Ok`.
    pub async fn mark_done(&mut self, task_id: &TaskId, record: ResultRecord) -> Result<()> {
        self.insert(task_id.clone(), record);
        self.flush().await
    }

    /// Every committed record, in commit order.
    pub fn load_all(&self) -> Vec<ResultRecord> {
        self.entries.iter().map(|(_, r)| r.clone()).collect()
    }

    /// Committed records for one benchmark and model.
    pub fn records_for(&self, benchmark: &str, model: &str) -> Vec<ResultRecord> {
        self.entries
            .iter()
            .filter(|(_, r)| r.benchmark == benchmark && r.model == model)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Number of committed tasks.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> Result<()> {
        let mut tasks = Map::new();
        for (id, record) in &self.entries {
            tasks.insert(id.to_string(), serde_json::to_value(record)?);
        }
        let mut root = Map::new();
        root.insert("tasks".to_string(), Value::Object(tasks));
        let content = serde_json::to_string_pretty(&Value::Object(root))?;

        let tmp = self.path.with_extension("tmp");
        let write = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &self.path).await
        };
        write.await.map_err(|e| {
            Error::Checkpoint(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

/// Generate a run id from the local time, e.g. `20240520_143022`.
pub fn new_run_id() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Summary of an existing checkpoint file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub run_id: String,
    pub path: PathBuf,
}

/// List run ids with a checkpoint in `dir`, sorted by id.
pub async fn list_runs(dir: impl AsRef<Path>) -> Result<Vec<RunInfo>> {
    let dir = dir.as_ref();
    let mut runs = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(runs),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(CHECKPOINT_EXT) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            runs.push(RunInfo {
                run_id: stem.to_string(),
                path: path.clone(),
            });
        }
    }
    runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
    Ok(runs)
}
