//! LegalBench: short-answer legal reasoning across six categories.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Benchmark, Item, ItemBody};
use crate::Result;
use crate::config::{CategoryTable, SuiteConfig};
use crate::dataset::LegalBenchSource;
use crate::sampling::{sample, seeded_rng};
use crate::scoring::exact_match;

/// A LegalBench example with the task context needed to prompt it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalBenchItem {
    pub task: String,
    pub text: String,
    pub citation: String,
    pub answer: String,
    /// Task rules and few-shot examples, when the task ships them.
    pub preamble: Option<String>,
}

/// How to present an item after a preamble. `{text}` and `{citation}` are
/// substituted.
fn item_format(task: &str) -> Option<&'static str> {
    Some(match task {
        "oral_argument_question_purpose" => "Question: {text}\nAnswer:",
        "abercrombie" => "Q: {text} What is the type of mark?\nA:",
        "definition_classification" => "Sentence: {text}\nLabel:",
        "citation_prediction_classification" => {
            "Text: {text}\nCitation: {citation}\nSupportive? Reply with either: Yes, No\nAnswer:"
        }
        "textualism_tool_dictionaries" | "textualism_tool_plain" => {
            "Text: {text}\nReply with either: Yes, No\nLabel:"
        }
        "successor_liability" => "Facts: {text}\nExceptions:",
        "function_of_decision_section" => "Text: {text}\nLabel:",
        "personal_jurisdiction" => {
            "Q: {text} Is there personal jurisdiction? Reply with either: Yes, No\nA:"
        }
        "canada_tax_court_outcomes" => {
            "JUDGMENT EXCERPT: {text} Reply with either: allowed, dismissed, other\nOUTCOME:"
        }
        "proa" => "Clause: {text} Reply with either: Yes, No\nA:",
        _ => return None,
    })
}

/// Substitute placeholders in one pass so item text is never re-expanded.
fn render_item(format: &str, text: &str, citation: &str) -> String {
    format
        .split("{text}")
        .map(|part| part.replace("{citation}", citation))
        .collect::<Vec<_>>()
        .join(text)
}

pub struct LegalBench {
    source: Arc<dyn LegalBenchSource>,
    categories: Vec<CategoryTable>,
    seed: u64,
}

impl LegalBench {
    pub const NAME: &'static str = "legalbench";

    pub fn new(source: Arc<dyn LegalBenchSource>, config: &SuiteConfig) -> Self {
        Self {
            source,
            categories: config.legalbench_tasks.clone(),
            seed: config.seed,
        }
    }
}

#[async_trait]
impl Benchmark for LegalBench {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn ensure_dataset_available(&self) -> Result<()> {
        self.source.ensure_available().await
    }

    /// Spread `count` evenly over the categories (at least one each), trying
    /// each category's tasks in order until its quota is met.
    async fn load_sample(&self, count: usize, _quick: bool) -> Result<Vec<Item>> {
        if self.categories.is_empty() {
            return Ok(Vec::new());
        }
        let quota = (count / self.categories.len()).max(1);
        let mut rng = seeded_rng(self.seed);
        let mut items = Vec::new();

        for category in &self.categories {
            let mut collected: Vec<LegalBenchItem> = Vec::new();
            for task in &category.entries {
                if collected.len() >= quota {
                    break;
                }
                let rows = self.source.task_rows(task).await?;
                if rows.is_empty() {
                    continue;
                }
                let picked = sample(&mut rng, &rows, quota - collected.len());
                let preamble = self.source.preamble(task).await;
                collected.extend(picked.into_iter().map(|row| LegalBenchItem {
                    task: task.clone(),
                    text: row.text,
                    citation: row.citation,
                    answer: row.answer,
                    preamble: preamble.clone(),
                }));
            }

            if collected.len() < quota {
                warn!(
                    category = %category.name,
                    found = collected.len(),
                    wanted = quota,
                    "LegalBench category short of items"
                );
            }
            for body in collected {
                items.push(Item {
                    index: items.len(),
                    category: category.name.clone(),
                    body: ItemBody::LegalBench(body),
                });
            }
        }

        info!(items = items.len(), "LegalBench sample loaded");
        Ok(items)
    }

    fn build_prompt(&self, item: &Item) -> Result<String> {
        let ItemBody::LegalBench(lb) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };

        if let (Some(preamble), Some(format)) = (&lb.preamble, item_format(&lb.task)) {
            return Ok(format!(
                "{preamble}\n\n{}",
                render_item(format, &lb.text, &lb.citation)
            ));
        }
        Ok(format!("Task: {}\n\n{}\n\nAnswer:", lb.task, lb.text))
    }

    fn evaluate(&self, prediction: &str, item: &Item) -> Result<f64> {
        let ItemBody::LegalBench(lb) = &item.body else {
            return Err(item.mismatch(Self::NAME));
        };
        Ok(exact_match(prediction, &lb.answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{StaticLegalBench, TaskRow};

    fn rows(prefix: &str, n: usize, answer: &str) -> Vec<TaskRow> {
        (0..n)
            .map(|i| TaskRow::new(format!("{prefix} {i}"), answer))
            .collect()
    }

    fn fixture() -> Arc<dyn LegalBenchSource> {
        Arc::new(
            StaticLegalBench::new()
                .with_task("abercrombie", rows("mark", 10, "generic"), Some("Classify marks."))
                .with_task("hearsay", rows("statement", 10, "Yes"), None)
                .with_task("proa", rows("clause", 1, "No"), Some("PROA rules."))
                .with_task("scalr", rows("case", 10, "A"), None)
                .with_task("diversity_1", rows("parties", 10, "Yes"), None)
                .with_task("successor_liability", rows("facts", 10, "de facto merger"), None)
                .with_task("function_of_decision_section", rows("section", 10, "Facts"), None),
        )
    }

    fn bench() -> LegalBench {
        LegalBench::new(fixture(), &SuiteConfig::default())
    }

    #[tokio::test]
    async fn sample_spreads_over_categories() {
        let items = bench().load_sample(12, true).await.unwrap();
        assert_eq!(items.len(), 12);
        let categories: Vec<_> = items.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(categories.iter().filter(|c| **c == "issue-spotting").count(), 2);
        assert_eq!(categories.iter().filter(|c| **c == "rhetorical-understanding").count(), 2);
        let indexes: Vec<_> = items.iter().map(|i| i.index).collect();
        assert_eq!(indexes, (0..12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn short_task_is_topped_up_from_the_next() {
        let items = bench().load_sample(24, false).await.unwrap();
        let conclusion: Vec<_> = items
            .iter()
            .filter(|i| i.category == "rule-conclusion")
            .map(|i| match &i.body {
                ItemBody::LegalBench(lb) => lb.task.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(conclusion, vec!["proa", "scalr", "scalr", "scalr"]);
    }

    #[tokio::test]
    async fn sampling_is_reproducible() {
        let a = bench().load_sample(24, false).await.unwrap();
        let b = bench().load_sample(24, false).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn prompt_uses_preamble_and_task_format() {
        let items = bench().load_sample(6, true).await.unwrap();
        let item = items.iter().find(|i| i.category == "issue-spotting").unwrap();
        let prompt = bench().build_prompt(item).unwrap();
        assert!(prompt.starts_with("Classify marks.\n\nQ: mark "));
        assert!(prompt.ends_with(" What is the type of mark?\nA:"));
    }

    #[tokio::test]
    async fn prompt_falls_back_without_preamble() {
        let items = bench().load_sample(6, true).await.unwrap();
        let item = items.iter().find(|i| i.category == "rule-recall").unwrap();
        let prompt = bench().build_prompt(item).unwrap();
        assert!(prompt.starts_with("Task: hearsay\n\nstatement "));
        assert!(prompt.ends_with("\n\nAnswer:"));
    }

    #[test]
    fn citation_format_substitutes_both_fields() {
        let format = item_format("citation_prediction_classification").unwrap();
        let rendered = render_item(format, "The court held {citation}", "410 U.S. 113");
        assert_eq!(
            rendered,
            "Text: The court held {citation}\nCitation: 410 U.S. 113\nSupportive? Reply with either: Yes, No\nAnswer:"
        );
        assert!(item_format("hearsay").is_none());
    }

    #[test]
    fn evaluate_uses_exact_match() {
        let item = Item {
            index: 0,
            category: "rule-recall".into(),
            body: ItemBody::LegalBench(LegalBenchItem {
                task: "hearsay".into(),
                text: "t".into(),
                citation: String::new(),
                answer: "Yes".into(),
                preamble: None,
            }),
        };
        assert_eq!(bench().evaluate("yes.", &item).unwrap(), 1.0);
        assert_eq!(bench().evaluate("No", &item).unwrap(), 0.0);
        assert_eq!(item.ground_truth(), "Yes");
    }

    #[tokio::test]
    async fn empty_answer_cell_never_scores() {
        let source = Arc::new(StaticLegalBench::new().with_task("hearsay", rows("statement", 3, ""), None));
        let bench = LegalBench::new(source, &SuiteConfig::default());
        let items = bench.load_sample(6, true).await.unwrap();
        let item = items.iter().find(|i| i.category == "rule-recall").unwrap();

        assert_eq!(item.ground_truth(), "");
        for reply in ["Yes", "No", "", "   "] {
            assert_eq!(bench.evaluate(reply, item).unwrap(), 0.0, "reply {reply:?}");
        }
    }

    #[test]
    fn foreign_item_is_rejected() {
        let item = Item {
            index: 3,
            category: "law".into(),
            body: ItemBody::MmluPro(crate::benchmark::MmluProItem {
                question: "q".into(),
                options: vec![],
                answer: 'A',
            }),
        };
        assert!(matches!(
            bench().evaluate("A", &item),
            Err(crate::Error::InvalidItem(_))
        ));
    }
}
