//! MMLU-Pro, law subset: multiple choice with up to ten options.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{Benchmark, Item, ItemBody, row_str};
use crate::Result;
use crate::config::SuiteConfig;
use crate::dataset::DatasetSource;
use crate::sampling::{sample, seeded_rng};
use crate::scoring::{OPTION_LABELS, score_choice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MmluProItem {
    pub question: String,
    pub options: Vec<String>,
    /// Correct option label.
    pub answer: char,
}

impl MmluProItem {
    fn from_row(row: &Value) -> Self {
        let options = row
            .get("options")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        let answer = row
            .get("answer_index")
            .and_then(Value::as_u64)
            .and_then(|i| OPTION_LABELS.get(i as usize).copied())
            .unwrap_or('A');
        Self {
            question: row_str(row, "question").to_string(),
            options,
            answer,
        }
    }
}

/// Category label of a row, lowercased.
fn row_subject(row: &Value) -> String {
    let category = row_str(row, "category");
    let subject = if category.is_empty() {
        row_str(row, "subject")
    } else {
        category
    };
    subject.trim().to_lowercase()
}

pub struct MmluPro {
    source: Arc<dyn DatasetSource>,
    subjects: Vec<String>,
    seed: u64,
}

impl MmluPro {
    pub const NAME: &'static str = "mmlupro";

    pub fn new(source: Arc<dyn DatasetSource>, config: &SuiteConfig) -> Self {
        Self {
            source,
            subjects: config.datasets.mmlupro_subjects.clone(),
            seed: config.seed,
        }
    }

    fn is_law(&self, row: &Value) -> bool {
        let subject = row_subject(row);
        self.subjects.iter().any(|s| *s == subject)
    }
}

#[async_trait]
impl Benchmark for MmluPro {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn ensure_dataset_available(&self) -> Result<()> {
        self.source.ensure_available().await
    }

    async fn load_sample(&self, count: usize, _quick: bool) -> Result<Vec<Item>> {
        let rows = self.source.records().await?;
        let mut pool: Vec<&Value> = rows.iter().filter(|r| self.is_law(r)).collect();
        if pool.is_empty() {
            warn!(rows = rows.len(), "No law questions found, using the first rows");
            pool = rows.iter().take(count).collect();
        }
        if pool.len() < count {
            warn!(found = pool.len(), wanted = count, "MMLU-Pro has fewer law questions than requested");
        }

        let mut rng = seeded_rng(self.seed);
        let items: Vec<Item> = sample(&mut rng, &pool, count)
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let subject = row_subject(row);
                Item {
                    index,
                    category: if subject.is_empty() { "law".to_string() } else { subject },
                    body: ItemBody::MmluPro(MmluProItem::from_row(row)),
                }
            })
            .collect();

        info!(items = items.len(), pool = pool.len(), "MMLU-Pro sample loaded");
        Ok(items)
    }

    fn build_prompt(&self, item: &Item) -> Result<String> {
        let ItemBody::MmluPro(mc) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        let labels: Vec<char> = OPTION_LABELS.iter().copied().take(mc.options.len()).collect();
        let options: Vec<String> = labels
            .iter()
            .zip(&mc.options)
            .map(|(label, text)| format!("{label}) {text}"))
            .collect();
        let choices: Vec<String> = labels.iter().map(char::to_string).collect();
        Ok(format!(
            "Question: {}\n\nOptions:\n{}\n\nAnswer with the letter of the correct option only ({}).",
            mc.question,
            options.join("\n"),
            choices.join(", ")
        ))
    }

    fn evaluate(&self, prediction: &str, item: &Item) -> Result<f64> {
        let ItemBody::MmluPro(mc) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        Ok(score_choice(prediction, mc.answer))
    }
}
