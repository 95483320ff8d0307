//! Offline dataset sources.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::DatasetSource;
use crate::{Error, Result};

/// Parse a JSONL file, skipping blank lines.
pub(crate) async fn read_jsonl(path: &Path) -> Result<Vec<Value>> {
    let content = tokio::fs::read_to_string(path).await?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Error::from))
        .collect()
}

/// Rows from a local JSONL file.
#[derive(Debug, Clone)]
pub struct JsonlDataset {
    path: PathBuf,
}

impl JsonlDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for JsonlDataset {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn ensure_available(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            Ok(())
        } else {
            Err(Error::Dataset(format!(
                "{} does not exist",
                self.path.display()
            )))
        }
    }

    async fn records(&self) -> Result<Vec<Value>> {
        self.ensure_available().await?;
        read_jsonl(&self.path).await
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDataset {
    name: String,
    rows: Vec<Value>,
}

impl StaticDataset {
    pub fn new(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

#[async_trait]
impl DatasetSource for StaticDataset {
    fn describe(&self) -> String {
        format!("{} (in memory)", self.name)
    }

    async fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    async fn records(&self) -> Result<Vec<Value>> {
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn jsonl_rows_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"n\": 1}\n\n{\"n\": 2}\n").unwrap();

        let source = JsonlDataset::new(&path);
        source.ensure_available().await.unwrap();
        let rows = source.records().await.unwrap();
        assert_eq!(rows, vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn missing_jsonl_is_dataset_error() {
        let dir = tempdir().unwrap();
        let source = JsonlDataset::new(dir.path().join("absent.jsonl"));
        let err = source.ensure_available().await.unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[tokio::test]
    async fn malformed_line_is_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"n\": 1}\nnot json\n").unwrap();
        let err = JsonlDataset::new(&path).records().await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn static_dataset_returns_rows() {
        let source = StaticDataset::new("fixture", vec![json!({"q": "x"})]);
        assert!(source.ensure_available().await.is_ok());
        assert_eq!(source.records().await.unwrap().len(), 1);
        assert_eq!(source.describe(), "fixture (in memory)");
    }
}
