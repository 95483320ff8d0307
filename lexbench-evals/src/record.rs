//! The atomic unit of benchmark output.

use serde::{Deserialize, Serialize};

use crate::config::Truncation;
use crate::types::TaskId;

/// Score above which a result counts as correct.
pub const CORRECT_THRESHOLD: f64 = 0.5;

/// One scored model answer.
///
/// `score` is the raw value returned by the benchmark (0/1 for exact-match
/// benchmarks, continuous F1 for span extraction); `is_correct` is derived
/// from it and never set independently. Field order is the column order of
/// the CSV sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordRepr")]
pub struct ResultRecord {
    pub model: String,
    pub benchmark: String,
    pub task_id: TaskId,
    pub category: String,
    pub prompt: String,
    pub response: String,
    pub ground_truth: String,
    pub score: f64,
    pub is_correct: bool,
    #[serde(rename = "time_ms")]
    pub latency_ms: u64,
    pub tokens_generated: u64,
    #[serde(rename = "tok_s")]
    pub tokens_per_second: f64,
    /// Zero when the model produced no hidden reasoning.
    pub thinking_tokens: u64,
}

/// Text fields of a record before truncation.
#[derive(Debug, Clone, Default)]
pub struct RecordText {
    pub category: String,
    pub prompt: String,
    pub response: String,
    pub ground_truth: String,
}

/// Timing and token accounting of the model call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordTiming {
    pub latency_ms: u64,
    pub tokens_generated: u64,
    pub tokens_per_second: f64,
    pub thinking_tokens: u64,
}

impl ResultRecord {
    /// Build a record, deriving correctness and truncating stored text.
    pub fn new(
        model: &str,
        benchmark: &str,
        task_id: TaskId,
        score: f64,
        text: RecordText,
        timing: RecordTiming,
        limits: &Truncation,
    ) -> Self {
        Self {
            model: model.to_string(),
            benchmark: benchmark.to_string(),
            task_id,
            category: text.category,
            prompt: truncate_chars(&text.prompt, limits.prompt),
            response: truncate_chars(&text.response, limits.response),
            ground_truth: truncate_chars(&text.ground_truth, limits.ground_truth),
            score,
            is_correct: score > CORRECT_THRESHOLD,
            latency_ms: timing.latency_ms,
            tokens_generated: timing.tokens_generated,
            tokens_per_second: timing.tokens_per_second,
            thinking_tokens: timing.thinking_tokens,
        }
    }
}

/// On-disk shape. Older checkpoints carry only `is_correct`.
#[derive(Deserialize)]
struct RecordRepr {
    model: String,
    benchmark: String,
    task_id: TaskId,
    #[serde(default)]
    category: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    response: String,
    #[serde(default)]
    ground_truth: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    is_correct: bool,
    #[serde(default, rename = "time_ms")]
    latency_ms: u64,
    #[serde(default)]
    tokens_generated: u64,
    #[serde(default, rename = "tok_s")]
    tokens_per_second: f64,
    #[serde(default)]
    thinking_tokens: u64,
}

impl From<RecordRepr> for ResultRecord {
    fn from(r: RecordRepr) -> Self {
        let score = r.score.unwrap_or(if r.is_correct { 1.0 } else { 0.0 });
        Self {
            model: r.model,
            benchmark: r.benchmark,
            task_id: r.task_id,
            category: r.category,
            prompt: r.prompt,
            response: r.response,
            ground_truth: r.ground_truth,
            score,
            is_correct: score > CORRECT_THRESHOLD,
            latency_ms: r.latency_ms,
            tokens_generated: r.tokens_generated,
            tokens_per_second: r.tokens_per_second,
            thinking_tokens: r.thinking_tokens,
        }
    }
}

/// Keep at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}
