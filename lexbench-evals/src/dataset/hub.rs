//! Hugging Face datasets fetched through the datasets-server REST API.
//!
//! Rows are paged from `/rows` (or `/filter` when a `where` clause is set)
//! and cached as JSONL under `<datasets_dir>/<owner>__<name>/<split>.jsonl`.
//! Once a split is cached no network call is made again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::DatasetSource;
use super::local::read_jsonl;
use crate::{Error, Result};

/// Rows per request; the server maximum.
const PAGE_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Every dataset used here lives in the `default` config.
const HUB_CONFIG: &str = "default";

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    #[serde(default)]
    num_rows_total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: Value,
}

/// A Hub dataset with an ordered list of candidate splits.
pub struct HubDataset {
    endpoint: String,
    dataset: String,
    splits: Vec<String>,
    filter: Option<String>,
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl HubDataset {
    /// Create a source for `dataset`, trying `splits` in order.
    pub fn new(
        endpoint: impl Into<String>,
        dataset: impl Into<String>,
        splits: Vec<String>,
        datasets_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let dataset = dataset.into();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Dataset(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            cache_dir: datasets_dir.as_ref().join(cache_slug(&dataset)),
            dataset,
            splits,
            filter: None,
            client,
        })
    }

    /// Restrict rows server-side with a datasets-server `where` clause.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    fn cache_path(&self, split: &str) -> PathBuf {
        self.cache_dir.join(format!("{split}.jsonl"))
    }

    async fn cached_split(&self) -> Option<PathBuf> {
        for split in &self.splits {
            let path = self.cache_path(split);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    async fn fetch_page(&self, split: &str, offset: usize) -> Result<RowsPage> {
        let offset = offset.to_string();
        let length = PAGE_SIZE.to_string();
        let mut query = vec![
            ("dataset", self.dataset.as_str()),
            ("config", HUB_CONFIG),
            ("split", split),
            ("offset", offset.as_str()),
            ("length", length.as_str()),
        ];
        let route = match &self.filter {
            Some(filter) => {
                query.push(("where", filter.as_str()));
                "filter"
            }
            None => "rows",
        };

        let url = format!("{}/{route}", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Dataset(format!("{}: {}", self.dataset, e)))?;

        if !response.status().is_success() {
            return Err(Error::Dataset(format!(
                "{} split {split}: server returned {}",
                self.dataset,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Dataset(format!("{}: bad page: {}", self.dataset, e)))
    }

    async fn download(&self, split: &str) -> Result<usize> {
        let mut rows = Vec::new();
        loop {
            let page = self.fetch_page(split, rows.len()).await?;
            let fetched = page.rows.len();
            rows.extend(page.rows.into_iter().map(|r| r.row));
            debug!(dataset = %self.dataset, split, rows = rows.len(), "Fetched page");

            let done = match page.num_rows_total {
                Some(total) => rows.len() >= total,
                None => fetched < PAGE_SIZE,
            };
            if done || fetched == 0 {
                break;
            }
        }

        if rows.is_empty() {
            return Err(Error::Dataset(format!(
                "{} split {split} has no rows",
                self.dataset
            )));
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let path = self.cache_path(split);
        let tmp = path.with_extension("jsonl.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        for row in &rows {
            let line = serde_json::to_string(row)?;
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        file.sync_all().await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl DatasetSource for HubDataset {
    fn describe(&self) -> String {
        self.dataset.clone()
    }

    async fn ensure_available(&self) -> Result<()> {
        if let Some(path) = self.cached_split().await {
            debug!(dataset = %self.dataset, path = %path.display(), "Dataset already cached");
            return Ok(());
        }

        for split in &self.splits {
            info!(dataset = %self.dataset, split = %split, "Downloading dataset");
            match self.download(split).await {
                Ok(rows) => {
                    info!(dataset = %self.dataset, split = %split, rows, "Dataset cached");
                    return Ok(());
                }
                Err(e) => {
                    warn!(dataset = %self.dataset, split = %split, error = %e, "Split unavailable");
                }
            }
        }

        Err(Error::Dataset(format!(
            "no split of {} could be downloaded (tried {})",
            self.dataset,
            self.splits.join(", ")
        )))
    }

    async fn records(&self) -> Result<Vec<Value>> {
        self.ensure_available().await?;
        let path = self
            .cached_split()
            .await
            .ok_or_else(|| Error::Dataset(format!("{} is not cached", self.dataset)))?;
        read_jsonl(&path).await
    }
}

/// Directory name for a dataset id: `owner/name` becomes `owner__name`.
fn cache_slug(dataset: &str) -> String {
    dataset.replace('/', "__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn slug_replaces_owner_separator() {
        assert_eq!(cache_slug("google/IFEval"), "google__IFEval");
        assert_eq!(cache_slug("local"), "local");
    }

    #[test]
    fn parse_rows_page() {
        let json = r#"{
            "features": [],
            "rows": [
                {"row_idx": 0, "row": {"prompt": "Write"}, "truncated_cells": []},
                {"row_idx": 1, "row": {"prompt": "Say"}, "truncated_cells": []}
            ],
            "num_rows_total": 541,
            "num_rows_per_page": 100,
            "partial": false
        }"#;
        let page: RowsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[1].row["prompt"], "Say");
        assert_eq!(page.num_rows_total, Some(541));
    }

    #[tokio::test]
    async fn cached_split_is_used_without_network() {
        let dir = tempdir().unwrap();
        let source = HubDataset::new(
            "http://127.0.0.1:9",
            "theatticusproject/cuad",
            vec!["test".into(), "train".into()],
            dir.path(),
        )
        .unwrap();

        let cache = dir.path().join("theatticusproject__cuad");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("train.jsonl"), "{\"question\": \"q\"}\n").unwrap();

        source.ensure_available().await.unwrap();
        let rows = source.records().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["question"], "q");
    }

    #[tokio::test]
    async fn unreachable_server_without_cache_fails() {
        let dir = tempdir().unwrap();
        let source = HubDataset::new(
            "http://127.0.0.1:9",
            "google/IFEval",
            vec!["train".into()],
            dir.path(),
        )
        .unwrap();

        let err = source.ensure_available().await.unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[tokio::test]
    #[ignore = "requires network access to the Hugging Face datasets-server"]
    async fn integration_downloads_small_dataset() {
        let dir = tempdir().unwrap();
        let source = HubDataset::new(
            crate::config::DEFAULT_HUB_ENDPOINT,
            "google/IFEval",
            vec!["train".into()],
            dir.path(),
        )
        .unwrap();
        let rows = source.records().await.unwrap();
        assert!(rows.len() > 500);
        assert!(rows[0].get("instruction_id_list").is_some());
    }
}
