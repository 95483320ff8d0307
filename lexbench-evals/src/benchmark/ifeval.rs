//! IFEval: verifiable instruction following.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{Benchmark, Item, ItemBody, row_str};
use crate::Result;
use crate::dataset::DatasetSource;
use crate::scoring::{Instruction, all_satisfied, instruction_verdicts};

const CATEGORY: &str = "instruction-following";

#[derive(Debug, Clone, PartialEq)]
pub struct IfEvalItem {
    pub prompt: String,
    pub instructions: Vec<Instruction>,
}

impl IfEvalItem {
    /// Pair `instruction_id_list` with `kwargs`; missing kwargs become empty.
    fn from_row(row: &Value) -> Self {
        let kwargs: Vec<Map<String, Value>> = row
            .get("kwargs")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|v| v.as_object().cloned().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();

        let instructions = row
            .get("instruction_id_list")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .enumerate()
            .map(|(i, id)| Instruction::new(id, kwargs.get(i).cloned().unwrap_or_default()))
            .collect();

        Self {
            prompt: row_str(row, "prompt").to_string(),
            instructions,
        }
    }
}

pub struct IfEval {
    source: Arc<dyn DatasetSource>,
}

impl IfEval {
    pub const NAME: &'static str = "ifeval";

    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Benchmark for IfEval {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn ensure_dataset_available(&self) -> Result<()> {
        self.source.ensure_available().await
    }

    /// The first `count` rows in dataset order; no random sampling.
    async fn load_sample(&self, count: usize, _quick: bool) -> Result<Vec<Item>> {
        let rows = self.source.records().await?;
        if rows.len() < count {
            warn!(found = rows.len(), wanted = count, "IFEval has fewer rows than requested");
        }

        let items: Vec<Item> = rows
            .iter()
            .take(count)
            .enumerate()
            .map(|(index, row)| Item {
                index,
                category: CATEGORY.to_string(),
                body: ItemBody::IfEval(IfEvalItem::from_row(row)),
            })
            .collect();

        info!(items = items.len(), "IFEval sample loaded");
        Ok(items)
    }

    fn build_prompt(&self, item: &Item) -> Result<String> {
        let ItemBody::IfEval(ifeval) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        Ok(ifeval.prompt.clone())
    }

    fn evaluate(&self, prediction: &str, item: &Item) -> Result<f64> {
        let ItemBody::IfEval(ifeval) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        Ok(if all_satisfied(prediction, &ifeval.instructions) {
            1.0
        } else {
            0.0
        })
    }

    fn details(&self, prediction: &str, item: &Item) -> Option<String> {
        let ItemBody::IfEval(ifeval) = &item.body else {
            return None;
        };
        let verdicts = instruction_verdicts(prediction, &ifeval.instructions);
        let failed: Vec<&str> = ifeval
            .instructions
            .iter()
            .zip(&verdicts)
            .filter(|(_, ok)| !**ok)
            .map(|(ins, _)| ins.id.as_str())
            .collect();
        let satisfied = verdicts.len() - failed.len();
        let mut line = format!("{satisfied}/{} instructions satisfied", verdicts.len());
        if !failed.is_empty() {
            line.push_str(&format!(" (failed: {})", failed.join(", ")));
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StaticDataset;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({
                "key": 1000,
                "prompt": "Describe a contract in at least 5 words without saying foo.",
                "instruction_id_list": [
                    "length_constraints:number_words",
                    "keywords:forbidden_words"
                ],
                "kwargs": [
                    {"relation": "at least", "num_words": 5, "forbidden_words": null},
                    {"relation": null, "num_words": null, "forbidden_words": ["foo"]}
                ]
            }),
            json!({
                "key": 1001,
                "prompt": "Answer in lowercase.",
                "instruction_id_list": ["change_case:english_lowercase"],
                "kwargs": [{}]
            }),
            json!({
                "key": 1002,
                "prompt": "Anything.",
                "instruction_id_list": ["detectable_format:no_comma", "detectable_format:title_case"]
            }),
        ]
    }

    fn bench() -> IfEval {
        IfEval::new(Arc::new(StaticDataset::new("ifeval", rows())))
    }

    #[tokio::test]
    async fn first_rows_in_order() {
        let items = bench().load_sample(2, true).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].category, "instruction-following");
        assert_eq!(bench().build_prompt(&items[1]).unwrap(), "Answer in lowercase.");
    }

    #[tokio::test]
    async fn short_dataset_returns_what_it_has() {
        let items = bench().load_sample(10, false).await.unwrap();
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn missing_kwargs_are_padded() {
        let items = bench().load_sample(3, false).await.unwrap();
        let ItemBody::IfEval(item) = &items[2].body else {
            panic!("expected an IFEval item");
        };
        assert_eq!(item.instructions.len(), 2);
        assert!(item.instructions.iter().all(|i| i.kwargs.is_empty()));
        assert_eq!(
            items[2].ground_truth(),
            "detectable_format:no_comma, detectable_format:title_case"
        );
    }

    #[tokio::test]
    async fn every_constraint_must_hold() {
        let items = bench().load_sample(1, true).await.unwrap();
        let bench = bench();
        assert_eq!(bench.evaluate("bar baz qux quux corge", &items[0]).unwrap(), 1.0);
        assert_eq!(bench.evaluate("foo bar", &items[0]).unwrap(), 0.0);
    }

    #[tokio::test]
    async fn details_list_failed_constraints() {
        let items = bench().load_sample(1, true).await.unwrap();
        let bench = bench();
        assert_eq!(
            bench.details("foo bar", &items[0]).as_deref(),
            Some("0/2 instructions satisfied (failed: length_constraints:number_words, keywords:forbidden_words)")
        );
        assert_eq!(
            bench.details("one two three four five", &items[0]).as_deref(),
            Some("2/2 instructions satisfied")
        );
    }
}
