//! Suite configuration.
//!
//! [`SuiteConfig`] is built once at startup and passed by reference to the
//! runner and to every benchmark constructor. Tests build one rooted in a
//! temporary directory with [`SuiteConfig::with_data_root`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Result;

/// Default RNG seed for reproducible sampling.
pub const DEFAULT_SEED: u64 = 42;

/// Hugging Face datasets-server endpoint.
pub const DEFAULT_HUB_ENDPOINT: &str = "https://datasets-server.huggingface.co";

/// LegalBench upstream repository.
pub const DEFAULT_LEGALBENCH_REPO: &str = "https://github.com/HazyResearch/legalbench.git";

/// LegalBench categories and the task directories backing each, in the
/// order tasks are tried.
pub const LEGALBENCH_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "issue-spotting",
        &[
            "abercrombie",
            "learned_hands_benefits",
            "learned_hands_business",
            "learned_hands_consumer",
            "learned_hands_courts",
            "learned_hands_crime",
            "learned_hands_divorce",
            "learned_hands_domestic_violence",
            "learned_hands_education",
            "learned_hands_employment",
        ],
    ),
    (
        "rule-recall",
        &[
            "definition_classification",
            "hearsay",
            "insurance_policy_interpretation",
            "contract_qa",
            "rule_qa",
        ],
    ),
    (
        "rule-conclusion",
        &[
            "personal_jurisdiction",
            "canada_tax_court_outcomes",
            "proa",
            "scalr",
        ],
    ),
    (
        "rule-application",
        &[
            "citation_prediction_classification",
            "diversity_1",
            "nys_judicial_ethics",
            "corporate_lobbying",
        ],
    ),
    (
        "interpretation",
        &[
            "ucc_v_common_law",
            "successor_liability",
            "textualism_tool_dictionaries",
            "textualism_tool_plain",
        ],
    ),
    (
        "rhetorical-understanding",
        &[
            "oral_argument_question_purpose",
            "function_of_decision_section",
        ],
    ),
];

/// CUAD categories and the question patterns (regex, matched against the
/// lowercased question) that select them. First match wins.
pub const CUAD_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "IP-Ownership-Assignment",
        &[
            "ip ownership",
            "intellectual property ownership",
            "ip assignment",
            "ip rights",
            "intellectual property",
            "ownership of ip",
        ],
    ),
    (
        "Non-Compete",
        &[
            "non-compete",
            "non compete",
            "noncompete",
            "competitive activities",
            "compete",
        ],
    ),
    ("License-Grant", &["license grant", "licence grant", "license to"]),
    (
        "Limitation-of-Liability",
        &[
            "limitation of liability",
            "limit.*liability",
            "liability.*limit",
            "cap on liability",
        ],
    ),
    ("Indemnification", &["indemnif"]),
    (
        "Termination-for-Convenience",
        &[
            "termination for convenience",
            "terminate.*convenience",
            "convenience termination",
        ],
    ),
    ("Change-of-Control", &["change of control", "change-of-control"]),
    ("Audit-Rights", &["audit", "inspection right", "right to audit"]),
];

/// Number of items to sample in normal and quick mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSize {
    pub normal: usize,
    pub quick: usize,
}

impl SampleSize {
    pub const fn new(normal: usize, quick: usize) -> Self {
        Self { normal, quick }
    }

    /// Size for the selected mode.
    pub fn pick(&self, quick: bool) -> usize {
        if quick { self.quick } else { self.normal }
    }
}

/// Character limits applied to stored record text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    pub prompt: usize,
    pub response: usize,
    pub ground_truth: usize,
}

impl Default for Truncation {
    fn default() -> Self {
        Self {
            prompt: 2000,
            response: 2000,
            ground_truth: 500,
        }
    }
}

/// Where each benchmark's data comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetIds {
    /// Base URL of the datasets-server API.
    pub hub_endpoint: String,
    pub cuad: String,
    /// Splits tried in order until one downloads.
    pub cuad_splits: Vec<String>,
    pub ifeval: String,
    pub ifeval_split: String,
    pub mmlupro: String,
    pub mmlupro_split: String,
    /// Server-side row filter (datasets-server `where` syntax).
    pub mmlupro_filter: Option<String>,
    /// Lowercased category names accepted as "law".
    pub mmlupro_subjects: Vec<String>,
    pub legalbench_repo: String,
}

impl Default for DatasetIds {
    fn default() -> Self {
        Self {
            hub_endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            cuad: "theatticusproject/cuad".to_string(),
            cuad_splits: vec!["test".to_string(), "train".to_string()],
            ifeval: "google/IFEval".to_string(),
            ifeval_split: "train".to_string(),
            mmlupro: "TIGER-Lab/MMLU-Pro".to_string(),
            mmlupro_split: "test".to_string(),
            mmlupro_filter: Some("\"category\"='law'".to_string()),
            mmlupro_subjects: vec!["law".to_string(), "jurisprudence".to_string()],
            legalbench_repo: DEFAULT_LEGALBENCH_REPO.to_string(),
        }
    }
}

/// A named group of entries (LegalBench tasks, CUAD patterns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    pub name: String,
    pub entries: Vec<String>,
}

impl CategoryTable {
    fn from_static(table: &[(&str, &[&str])]) -> Vec<Self> {
        table
            .iter()
            .map(|(name, entries)| Self {
                name: (*name).to_string(),
                entries: entries.iter().map(|e| (*e).to_string()).collect(),
            })
            .collect()
    }
}

/// Everything the suite needs to know, resolved once.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub checkpoint_dir: PathBuf,
    pub datasets_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Seed shared by every sampler.
    pub seed: u64,
    /// Benchmark name to sample size.
    pub sample_sizes: HashMap<String, SampleSize>,
    /// Used for benchmarks missing from `sample_sizes`.
    pub fallback_sample: SampleSize,
    pub truncation: Truncation,
    pub datasets: DatasetIds,
    pub legalbench_tasks: Vec<CategoryTable>,
    pub cuad_categories: Vec<CategoryTable>,
    /// Contract text kept per CUAD item.
    pub cuad_context_chars: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: lexbench_paths::checkpoint_dir(),
            datasets_dir: lexbench_paths::datasets_dir(),
            results_dir: lexbench_paths::results_dir(),
            logs_dir: lexbench_paths::logs_dir(),
            seed: DEFAULT_SEED,
            sample_sizes: default_sample_sizes(),
            fallback_sample: SampleSize::new(20, 5),
            truncation: Truncation::default(),
            datasets: DatasetIds::default(),
            legalbench_tasks: CategoryTable::from_static(LEGALBENCH_CATEGORIES),
            cuad_categories: CategoryTable::from_static(CUAD_CATEGORIES),
            cuad_context_chars: 4000,
        }
    }
}

fn default_sample_sizes() -> HashMap<String, SampleSize> {
    [
        ("legalbench", SampleSize::new(24, 12)),
        ("cuad", SampleSize::new(10, 3)),
        ("ifeval", SampleSize::new(100, 10)),
        ("mmlupro", SampleSize::new(200, 20)),
    ]
    .into_iter()
    .map(|(name, size)| (name.to_string(), size))
    .collect()
}

impl SuiteConfig {
    /// Default configuration with every directory under `root`.
    pub fn with_data_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            checkpoint_dir: root.join("checkpoints"),
            datasets_dir: root.join("datasets"),
            results_dir: root.join("results"),
            logs_dir: root.join("logs"),
            ..Self::default()
        }
    }

    /// Sample size for `benchmark` in the selected mode.
    pub fn sample_size(&self, benchmark: &str, quick: bool) -> usize {
        self.sample_sizes
            .get(benchmark)
            .unwrap_or(&self.fallback_sample)
            .pick(quick)
    }

    /// Create the output directories.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.checkpoint_dir,
            &self.datasets_dir,
            &self.results_dir,
            &self.logs_dir,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sample_sizes_follow_table() {
        let config = SuiteConfig::default();
        assert_eq!(config.sample_size("legalbench", false), 24);
        assert_eq!(config.sample_size("legalbench", true), 12);
        assert_eq!(config.sample_size("cuad", false), 10);
        assert_eq!(config.sample_size("mmlupro", true), 20);
    }

    #[test]
    fn unknown_benchmark_uses_fallback_size() {
        let config = SuiteConfig::default();
        assert_eq!(config.sample_size("bigbench", false), 20);
        assert_eq!(config.sample_size("bigbench", true), 5);
    }

    #[test]
    fn default_tables_have_expected_shape() {
        let config = SuiteConfig::default();
        assert_eq!(config.legalbench_tasks.len(), 6);
        assert_eq!(config.legalbench_tasks[0].name, "issue-spotting");
        assert_eq!(config.legalbench_tasks[0].entries[0], "abercrombie");
        assert_eq!(config.cuad_categories.len(), 8);
        assert_eq!(config.cuad_categories[4].entries, vec!["indemnif"]);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn data_root_moves_every_directory() {
        let config = SuiteConfig::with_data_root("/tmp/lb");
        assert_eq!(config.checkpoint_dir, PathBuf::from("/tmp/lb/checkpoints"));
        assert_eq!(config.datasets_dir, PathBuf::from("/tmp/lb/datasets"));
        assert_eq!(config.results_dir, PathBuf::from("/tmp/lb/results"));
        assert_eq!(config.logs_dir, PathBuf::from("/tmp/lb/logs"));
    }

    #[tokio::test]
    async fn ensure_dirs_creates_tree() {
        let dir = tempdir().unwrap();
        let config = SuiteConfig::with_data_root(dir.path().join("data"));
        config.ensure_dirs().await.unwrap();
        assert!(config.checkpoint_dir.is_dir());
        assert!(config.results_dir.is_dir());
    }
}
