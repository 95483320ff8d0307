//! CUAD: clause extraction from commercial contracts, scored by token F1.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use super::{Benchmark, Item, ItemBody, row_str};
use crate::config::SuiteConfig;
use crate::dataset::DatasetSource;
use crate::record::truncate_chars;
use crate::sampling::{sample, seeded_rng};
use crate::scoring::best_f1;
use crate::{Error, Result};

/// Reply expected when the contract has no matching clause.
pub const NO_CLAUSE_PRESENT: &str = "NO CLAUSE PRESENT";

/// Acceptable answers for a CUAD question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundTruth {
    /// The contract contains no such clause.
    Absent,
    /// One or more acceptable spans.
    Present(Vec<String>),
}

impl GroundTruth {
    fn from_answers(answers: Option<&Value>) -> Self {
        let texts = match answers {
            Some(Value::Object(map)) => map.get("text").and_then(Value::as_array),
            Some(Value::Array(list)) => Some(list),
            _ => None,
        };
        let spans: Vec<String> = texts
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect();
        if spans.is_empty() {
            Self::Absent
        } else {
            Self::Present(spans)
        }
    }
}

impl fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str(NO_CLAUSE_PRESENT),
            Self::Present(spans) => {
                let json = serde_json::to_string(spans).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuadItem {
    pub question: String,
    /// Contract text, already truncated.
    pub context: String,
    pub answer: GroundTruth,
}

struct CategoryMatcher {
    name: String,
    patterns: Vec<Regex>,
}

impl CategoryMatcher {
    fn matches(&self, question: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(question))
    }
}

pub struct Cuad {
    source: Arc<dyn DatasetSource>,
    categories: Vec<CategoryMatcher>,
    context_chars: usize,
    seed: u64,
}

impl Cuad {
    pub const NAME: &'static str = "cuad";

    /// Build the benchmark, compiling the category patterns.
    pub fn new(source: Arc<dyn DatasetSource>, config: &SuiteConfig) -> Result<Self> {
        let categories = config
            .cuad_categories
            .iter()
            .map(|table| {
                let patterns = table
                    .entries
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| {
                            Error::Dataset(format!("bad CUAD pattern {p:?} for {}: {e}", table.name))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CategoryMatcher {
                    name: table.name.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source,
            categories,
            context_chars: config.cuad_context_chars,
            seed: config.seed,
        })
    }

    /// First category whose patterns match the lowercased question.
    fn categorize(&self, question: &str) -> Option<usize> {
        let lowered = question.to_lowercase();
        self.categories.iter().position(|c| c.matches(&lowered))
    }
}

#[async_trait]
impl Benchmark for Cuad {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn ensure_dataset_available(&self) -> Result<()> {
        self.source.ensure_available().await
    }

    /// Draw `count` items from every category.
    async fn load_sample(&self, count: usize, _quick: bool) -> Result<Vec<Item>> {
        let rows = self.source.records().await?;
        let mut buckets: Vec<Vec<CuadItem>> = vec![Vec::new(); self.categories.len()];

        for row in &rows {
            let question = row_str(row, "question");
            let Some(slot) = self.categorize(question) else {
                continue;
            };
            buckets[slot].push(CuadItem {
                question: question.to_string(),
                context: truncate_chars(row_str(row, "context"), self.context_chars),
                answer: GroundTruth::from_answers(row.get("answers")),
            });
        }

        let mut rng = seeded_rng(self.seed);
        let mut items = Vec::new();
        for (category, bucket) in self.categories.iter().zip(&buckets) {
            if bucket.is_empty() {
                warn!(category = %category.name, "No CUAD questions matched category");
                continue;
            }
            if bucket.len() < count {
                warn!(
                    category = %category.name,
                    found = bucket.len(),
                    wanted = count,
                    "CUAD category short of items"
                );
            }
            for body in sample(&mut rng, bucket, count) {
                items.push(Item {
                    index: items.len(),
                    category: category.name.clone(),
                    body: ItemBody::Cuad(body),
                });
            }
        }

        info!(items = items.len(), rows = rows.len(), "CUAD sample loaded");
        Ok(items)
    }

    fn build_prompt(&self, item: &Item) -> Result<String> {
        let ItemBody::Cuad(cuad) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        Ok(format!(
            "From the following contract, extract the text relevant to: {}.\n\
             Reply ONLY with the exact excerpt or '{NO_CLAUSE_PRESENT}' if absent.\n\n\
             Contract:\n{}\n\nExcerpt:",
            item.category, cuad.context
        ))
    }

    fn evaluate(&self, prediction: &str, item: &Item) -> Result<f64> {
        let ItemBody::Cuad(cuad) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        Ok(match &cuad.answer {
            GroundTruth::Absent => best_f1(prediction, &[NO_CLAUSE_PRESENT]),
            GroundTruth::Present(spans) => best_f1(prediction, spans),
        })
    }
}
