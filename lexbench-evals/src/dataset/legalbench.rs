//! LegalBench task tables and prompt preambles.
//!
//! The upstream repository ships one directory per task under `tasks/`, each
//! with a CSV/TSV data file and usually a `claude_prompt.txt` holding the
//! task rules and few-shot examples.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Data files tried in order before falling back to any CSV/TSV.
const DATA_FILE_CANDIDATES: &[&str] = &[
    "base_task.csv",
    "test.csv",
    "data.csv",
    "train.csv",
    "base_task.tsv",
    "test.tsv",
    "train.tsv",
];

const PREAMBLE_FILE: &str = "claude_prompt.txt";

/// One labelled example of a LegalBench task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRow {
    pub text: String,
    pub answer: String,
    /// Only present for citation tasks; empty otherwise.
    pub citation: String,
}

impl TaskRow {
    pub fn new(text: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            answer: answer.into(),
            citation: String::new(),
        }
    }
}

/// Access to LegalBench tasks.
#[async_trait]
pub trait LegalBenchSource: Send + Sync {
    /// Clone or otherwise prepare the data. Idempotent.
    async fn ensure_available(&self) -> Result<()>;

    /// Rows of `task`; empty when the task or its data file is missing.
    async fn task_rows(&self, task: &str) -> Result<Vec<TaskRow>>;

    /// Prompt preamble for `task`, if the task ships one.
    async fn preamble(&self, task: &str) -> Option<String>;
}

// ────────────────────────────────────────────────────────────────────────────
// LegalBenchRepo
// ────────────────────────────────────────────────────────────────────────────

/// A shallow git clone of the LegalBench repository.
pub struct LegalBenchRepo {
    repo_url: String,
    dir: PathBuf,
    preambles: Mutex<HashMap<String, Option<String>>>,
}

impl LegalBenchRepo {
    /// Clone target is `<datasets_dir>/legalbench`.
    pub fn new(repo_url: impl Into<String>, datasets_dir: impl AsRef<Path>) -> Self {
        Self::at(repo_url, datasets_dir.as_ref().join("legalbench"))
    }

    /// Use an explicit checkout directory.
    pub fn at(repo_url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_url: repo_url.into(),
            dir: dir.into(),
            preambles: Mutex::new(HashMap::new()),
        }
    }

    fn task_dir(&self, task: &str) -> PathBuf {
        self.dir.join("tasks").join(task)
    }

    async fn find_data_file(task_dir: &Path) -> Option<PathBuf> {
        for name in DATA_FILE_CANDIDATES {
            let candidate = task_dir.join(name);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }

        let mut entries = tokio::fs::read_dir(task_dir).await.ok()?;
        let mut found = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if table_delimiter(&path).is_some() {
                found.push(path);
            }
        }
        // CSV before TSV, then by name.
        found.sort_by_key(|p| (table_delimiter(p) != Some(b','), p.clone()));
        found.into_iter().next()
    }
}

#[async_trait]
impl LegalBenchSource for LegalBenchRepo {
    async fn ensure_available(&self) -> Result<()> {
        if tokio::fs::try_exists(self.dir.join(".git")).await? {
            debug!(dir = %self.dir.display(), "LegalBench already cloned");
            return Ok(());
        }
        if let Some(parent) = self.dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(url = %self.repo_url, dir = %self.dir.display(), "Cloning LegalBench");
        let output = Command::new("git")
            .args(["clone", "--depth", "1", &self.repo_url])
            .arg(&self.dir)
            .output()
            .await
            .map_err(|e| Error::Dataset(format!("could not run git: {e}")))?;

        if !output.status.success() {
            return Err(Error::Dataset(format!(
                "git clone of {} failed: {}",
                self.repo_url,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        info!("LegalBench clone complete");
        Ok(())
    }

    async fn task_rows(&self, task: &str) -> Result<Vec<TaskRow>> {
        let task_dir = self.task_dir(task);
        if !tokio::fs::try_exists(&task_dir).await.unwrap_or(false) {
            debug!(task, "Task directory not found");
            return Ok(Vec::new());
        }
        let Some(path) = Self::find_data_file(&task_dir).await else {
            debug!(task, "No data file");
            return Ok(Vec::new());
        };

        let delimiter = table_delimiter(&path).unwrap_or(b',');
        let rows = match tokio::fs::read(&path).await {
            Ok(bytes) => parse_task_table(&bytes, delimiter),
            Err(e) => Err(e.into()),
        };
        match rows {
            Ok(rows) => Ok(rows),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read task table");
                Ok(Vec::new())
            }
        }
    }

    async fn preamble(&self, task: &str) -> Option<String> {
        let cached = self
            .preambles
            .lock()
            .ok()
            .and_then(|cache| cache.get(task).cloned());
        if let Some(cached) = cached {
            return cached;
        }

        let path = self.task_dir(task).join(PREAMBLE_FILE);
        let preamble = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => clean_preamble(&raw),
            Err(_) => None,
        };

        if let Ok(mut cache) = self.preambles.lock() {
            cache.insert(task.to_string(), preamble.clone());
        }
        preamble
    }
}

fn table_delimiter(path: &Path) -> Option<u8> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => Some(b','),
        Some("tsv") => Some(b'\t'),
        _ => None,
    }
}

/// Parse a task table into rows.
///
/// Column names are trimmed and lowercased, `question` or `paragraph` stand
/// in for a missing `text` column, and rows lacking `text` or `answer` are
/// dropped.
pub fn parse_task_table(bytes: &[u8], delimiter: u8) -> Result<Vec<TaskRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut fields: HashMap<&str, &str> = headers
            .iter()
            .map(String::as_str)
            .zip(record.iter().map(str::trim))
            .collect();

        if !fields.contains_key("text") {
            let alias = ["question", "paragraph"]
                .iter()
                .find_map(|a| fields.get(a).copied());
            if let Some(value) = alias {
                fields.insert("text", value);
            }
        }

        if let (Some(text), Some(answer)) = (fields.get("text"), fields.get("answer")) {
            rows.push(TaskRow {
                text: (*text).to_string(),
                answer: (*answer).to_string(),
                citation: fields.get("citation").map(|c| c.to_string()).unwrap_or_default(),
            });
        }
    }
    Ok(rows)
}

/// Drop template placeholder lines and trailing blank lines. `None` when
/// nothing is left.
pub fn clean_preamble(raw: &str) -> Option<String> {
    let mut lines: Vec<&str> = raw
        .trim()
        .lines()
        .filter(|line| !line.contains("{{text}}") && !line.contains("{{citation}}"))
        .collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StaticLegalBench
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct StaticTask {
    rows: Vec<TaskRow>,
    preamble: Option<String>,
}

/// In-memory LegalBench tasks for offline checks.
#[derive(Debug, Clone, Default)]
pub struct StaticLegalBench {
    tasks: HashMap<String, StaticTask>,
}

impl StaticLegalBench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task with its rows and optional preamble.
    pub fn with_task(
        mut self,
        task: impl Into<String>,
        rows: Vec<TaskRow>,
        preamble: Option<&str>,
    ) -> Self {
        self.tasks.insert(
            task.into(),
            StaticTask {
                rows,
                preamble: preamble.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl LegalBenchSource for StaticLegalBench {
    async fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    async fn task_rows(&self, task: &str) -> Result<Vec<TaskRow>> {
        Ok(self
            .tasks
            .get(task)
            .map(|t| t.rows.clone())
            .unwrap_or_default())
    }

    async fn preamble(&self, task: &str) -> Option<String> {
        self.tasks.get(task).and_then(|t| t.preamble.clone())
    }
}
