//! Append-only result output.
//!
//! Sinks receive every [`ResultRecord`] right after it is checkpointed and
//! flush it before returning, so the output file is as current as the
//! checkpoint. A crash between the two writes leaves the sink one record
//! behind; [`backfill`] closes the gap on the next run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::record::ResultRecord;
use crate::types::TaskId;
use crate::{Error, Result};

/// Destination for result records.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append one record and flush it.
    async fn write(&self, record: &ResultRecord) -> Result<()>;

    /// File the sink writes to.
    fn path(&self) -> &Path;

    /// Task ids already present in the file. Empty when the file does not
    /// exist; rows that cannot be parsed are ignored.
    async fn written_ids(&self) -> Result<HashSet<TaskId>>;
}

/// Write every checkpointed record the sink does not hold yet.
///
/// Returns how many records were written.
pub async fn backfill(checkpoint: &CheckpointStore, sink: &dyn ResultSink) -> Result<usize> {
    if checkpoint.count() == 0 {
        return Ok(0);
    }
    let written = sink.written_ids().await?;
    let mut added = 0;
    for record in checkpoint.load_all() {
        if !written.contains(&record.task_id) {
            sink.write(&record).await?;
            added += 1;
        }
    }
    if added > 0 {
        info!(
            records = added,
            sink = %sink.path().display(),
            "Backfilled checkpointed records into results"
        );
    }
    Ok(added)
}

async fn append(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether the file is missing, empty, or ends in a newline.
async fn ends_cleanly(path: &Path) -> Result<bool> {
    let mut file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    };
    if file.metadata().await?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

async fn is_empty_or_missing(path: &Path) -> Result<bool> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// One JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every record back, in write order.
    pub async fn read_all(&self) -> Result<Vec<ResultRecord>> {
        let content = fs::read_to_string(&self.path).await?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Error::from))
            .collect()
    }
}

#[async_trait]
impl ResultSink for JsonlSink {
    async fn write(&self, record: &ResultRecord) -> Result<()> {
        let mut line = Vec::new();
        if !ends_cleanly(&self.path).await? {
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, record)?;
        line.push(b'\n');
        append(&self.path, &line).await
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn written_ids(&self) -> Result<HashSet<TaskId>> {
        let Some(bytes) = read_if_exists(&self.path).await? else {
            return Ok(HashSet::new());
        };
        let mut ids = HashSet::new();
        for line in String::from_utf8_lossy(&bytes).lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ResultRecord>(line) {
                Ok(record) => {
                    ids.insert(record.task_id);
                }
                Err(e) => warn!(path = %self.path.display(), error = %e, "Ignoring unreadable result line"),
            }
        }
        Ok(ids)
    }
}

/// CSV with a header row, columns in [`ResultRecord`] field order.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn read_all(&self) -> Result<Vec<ResultRecord>> {
        let bytes = fs::read(&self.path).await?;
        csv::Reader::from_reader(bytes.as_slice())
            .deserialize()
            .map(|row| row.map_err(Error::from))
            .collect()
    }

    fn encode(record: &ResultRecord, header: bool) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(header)
            .from_writer(Vec::new());
        writer.serialize(record)?;
        writer.flush()?;
        writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

#[async_trait]
impl ResultSink for CsvSink {
    async fn write(&self, record: &ResultRecord) -> Result<()> {
        let header = is_empty_or_missing(&self.path).await?;
        let bytes = Self::encode(record, header)?;
        append(&self.path, &bytes).await
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn written_ids(&self) -> Result<HashSet<TaskId>> {
        let Some(bytes) = read_if_exists(&self.path).await? else {
            return Ok(HashSet::new());
        };
        let mut ids = HashSet::new();
        for row in csv::Reader::from_reader(bytes.as_slice()).deserialize::<ResultRecord>() {
            match row {
                Ok(record) => {
                    ids.insert(record.task_id);
                }
                Err(e) => warn!(path = %self.path.display(), error = %e, "Ignoring unreadable result row"),
            }
        }
        Ok(ids)
    }
}
