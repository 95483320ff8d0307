//! Aggregate scores across models and benchmarks.

use std::collections::{BTreeMap, HashMap};

use crate::benchmark::{Cuad, LegalBench};
use crate::record::ResultRecord;

/// Running mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mean {
    sum: f64,
    pub count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Mean as a percentage rounded to one decimal.
    pub fn percent(&self) -> Option<f64> {
        self.value().map(|v| (v * 1000.0).round() / 10.0)
    }
}

/// Mean generation speed of one model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Throughput {
    pub all: Mean,
    /// Records with reasoning tokens.
    pub thinking: Mean,
    pub no_thinking: Mean,
}

type PairKey = (String, String);

/// Scores of a set of records.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Models in order of first appearance.
    pub models: Vec<String>,
    /// Benchmarks in order of first appearance.
    pub benchmarks: Vec<String>,
    scores: HashMap<PairKey, Mean>,
    /// (model, category) for LegalBench.
    pub legalbench_categories: BTreeMap<PairKey, Mean>,
    /// (model, category) macro F1 for CUAD.
    pub cuad_categories: BTreeMap<PairKey, Mean>,
    pub throughput: BTreeMap<String, Throughput>,
}

impl Summary {
    /// Summarize `records`. A task id seen more than once counts once, with
    /// its last record.
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut latest: Vec<&ResultRecord> = Vec::new();
        let mut seen: HashMap<(&str, &str, &str), usize> = HashMap::new();
        for record in records {
            let key = (
                record.model.as_str(),
                record.benchmark.as_str(),
                record.task_id.as_str(),
            );
            match seen.get(&key) {
                Some(&pos) => latest[pos] = record,
                None => {
                    seen.insert(key, latest.len());
                    latest.push(record);
                }
            }
        }

        let mut summary = Self::default();
        for record in latest {
            if !summary.models.contains(&record.model) {
                summary.models.push(record.model.clone());
            }
            if !summary.benchmarks.contains(&record.benchmark) {
                summary.benchmarks.push(record.benchmark.clone());
            }

            let pair = (record.model.clone(), record.benchmark.clone());
            summary.scores.entry(pair).or_default().add(record.score);

            let by_category = match record.benchmark.as_str() {
                LegalBench::NAME => Some(&mut summary.legalbench_categories),
                Cuad::NAME => Some(&mut summary.cuad_categories),
                _ => None,
            };
            if let Some(table) = by_category {
                table
                    .entry((record.model.clone(), record.category.clone()))
                    .or_default()
                    .add(record.score);
            }

            let speed = summary.throughput.entry(record.model.clone()).or_default();
            speed.all.add(record.tokens_per_second);
            if record.thinking_tokens > 0 {
                speed.thinking.add(record.tokens_per_second);
            } else {
                speed.no_thinking.add(record.tokens_per_second);
            }
        }
        summary
    }

    /// Mean score of `model` on `benchmark`.
    pub fn score(&self, model: &str, benchmark: &str) -> Option<Mean> {
        self.scores
            .get(&(model.to_string(), benchmark.to_string()))
            .copied()
    }

    /// Number of distinct tasks summarized.
    pub fn task_count(&self) -> usize {
        self.scores.values().map(|m| m.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
