//! Verifiable instruction constraints (IFEval).
//!
//! Each constraint is identified by an id such as
//! `length_constraints:number_words` and parameterized by a JSON object of
//! keyword arguments. A response passes an item only when every constraint
//! holds.
//!
//! Unknown ids are assumed satisfied. A verifier that cannot interpret its
//! arguments reports the constraint as not satisfied.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// One constraint attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Instruction {
    pub fn new(id: impl Into<String>, kwargs: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            kwargs,
        }
    }
}

/// A verifier could not interpret its arguments.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("argument {name} has unusable value {value}")]
    InvalidArgument { name: &'static str, value: String },
}

type VerifyResult = std::result::Result<bool, VerifyError>;
type Verifier = fn(&str, &Map<String, Value>) -> VerifyResult;

/// Verifiers by instruction id. Also searched by prefix, in this order.
const VERIFIERS: &[(&str, Verifier)] = &[
    ("length_constraints:number_words", verify_word_count),
    ("length_constraints:word_count", verify_word_count),
    ("language:response_language", verify_response_language),
    ("detectable_format:json_format", verify_json_format),
    ("detectable_format:json", verify_json_format),
    ("detectable_format:number_bullet_lists", verify_bullet_points),
    ("detectable_format:bullet_points", verify_bullet_points),
    ("detectable_format:title_case", verify_title_case),
    ("detectable_format:no_comma", verify_no_comma),
    ("keywords:forbidden_words", verify_forbidden_words),
    ("keywords:existence", verify_include_keywords),
    ("keywords:include_keywords", verify_include_keywords),
    ("length_constraints:number_sentences", verify_sentence_count),
    ("length_constraints:number_paragraphs", verify_paragraph_count),
    ("change_case:capital_word_frequency", verify_uppercase),
    ("change_case:english_capital", verify_uppercase),
    ("change_case:english_lowercase", verify_lowercase),
    ("startend:starter", verify_starts_with),
    ("startend:end_checker", verify_ends_with),
    ("combination:repeat_prompt", verify_repeat_prompt),
];

fn find_verifier(id: &str) -> Option<Verifier> {
    VERIFIERS
        .iter()
        .find(|(key, _)| *key == id)
        .or_else(|| VERIFIERS.iter().find(|(key, _)| id.starts_with(key)))
        .map(|(_, f)| *f)
}

/// Check one constraint.
pub fn check_instruction(id: &str, response: &str, kwargs: &Map<String, Value>) -> bool {
    let Some(verifier) = find_verifier(id) else {
        debug!(instruction = id, "No verifier, assuming satisfied");
        return true;
    };
    match verifier(response, kwargs) {
        Ok(ok) => ok,
        Err(e) => {
            warn!(instruction = id, error = %e, "Verifier failed");
            false
        }
    }
}

/// Per-constraint verdicts, in order.
pub fn instruction_verdicts(response: &str, instructions: &[Instruction]) -> Vec<bool> {
    instructions
        .iter()
        .map(|i| check_instruction(&i.id, response, &i.kwargs))
        .collect()
}

/// Whether every constraint holds. Vacuously true for no constraints.
pub fn all_satisfied(response: &str, instructions: &[Instruction]) -> bool {
    instructions
        .iter()
        .all(|i| check_instruction(&i.id, response, &i.kwargs))
}

// ────────────────────────────────────────────────────────────────────────────
// Argument helpers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    AtLeast,
    AtMost,
    Exactly,
    Unconstrained,
}

impl Relation {
    fn parse(s: Option<&str>) -> Self {
        match s.unwrap_or("at least") {
            "at least" | "more than" => Self::AtLeast,
            "at most" | "less than" | "fewer than" => Self::AtMost,
            "exactly" => Self::Exactly,
            _ => Self::Unconstrained,
        }
    }

    fn holds(self, actual: i64, target: i64) -> bool {
        match self {
            Self::AtLeast => actual >= target,
            Self::AtMost => actual <= target,
            Self::Exactly => actual == target,
            Self::Unconstrained => true,
        }
    }
}

fn str_arg<'a>(kwargs: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    kwargs.get(name).and_then(Value::as_str)
}

/// Integer argument; missing or null is 0.
fn int_arg(kwargs: &Map<String, Value>, name: &'static str) -> Result<i64, VerifyError> {
    let invalid = |v: &Value| VerifyError::InvalidArgument {
        name,
        value: v.to_string(),
    };
    match kwargs.get(name) {
        None | Some(Value::Null) => Ok(0),
        Some(v @ Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse().map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

/// List-of-strings argument; missing or null is empty.
fn list_arg(kwargs: &Map<String, Value>, name: &'static str) -> Result<Vec<String>, VerifyError> {
    match kwargs.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()),
        Some(v) => Err(VerifyError::InvalidArgument {
            name,
            value: v.to_string(),
        }),
    }
}

fn count_check(kwargs: &Map<String, Value>, target: &'static str, actual: usize) -> VerifyResult {
    let relation = Relation::parse(str_arg(kwargs, "relation"));
    let target = int_arg(kwargs, target)?;
    Ok(relation.holds(actual as i64, target))
}

// ────────────────────────────────────────────────────────────────────────────
// Verifiers
// ────────────────────────────────────────────────────────────────────────────

static JSON_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json)?\n?").expect("fence pattern is valid"));
static JSON_FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n?```$").expect("fence pattern is valid"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*•]\s+").expect("bullet pattern is valid"));
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence pattern is valid"));

fn verify_word_count(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    count_check(kwargs, "num_words", response.split_whitespace().count())
}

// Needs a language identifier; not verified.
fn verify_response_language(_response: &str, _kwargs: &Map<String, Value>) -> VerifyResult {
    Ok(true)
}

fn verify_json_format(response: &str, _kwargs: &Map<String, Value>) -> VerifyResult {
    let cleaned = response.trim();
    let cleaned = JSON_FENCE_OPEN.replace(cleaned, "");
    let cleaned = JSON_FENCE_CLOSE.replace(&cleaned, "");
    Ok(serde_json::from_str::<Value>(&cleaned).is_ok())
}

fn verify_bullet_points(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    count_check(kwargs, "num_bullets", BULLET.find_iter(response).count())
}

fn verify_title_case(response: &str, _kwargs: &Map<String, Value>) -> VerifyResult {
    Ok(response.split_whitespace().all(|word| match word.chars().next() {
        Some(c) if c.is_ascii_punctuation() => true,
        Some(c) => c.is_uppercase(),
        None => true,
    }))
}

fn verify_no_comma(response: &str, _kwargs: &Map<String, Value>) -> VerifyResult {
    Ok(!response.contains(','))
}

fn verify_forbidden_words(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let lower = response.to_lowercase();
    Ok(list_arg(kwargs, "forbidden_words")?
        .iter()
        .all(|w| !lower.contains(&w.to_lowercase())))
}

fn verify_include_keywords(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let lower = response.to_lowercase();
    Ok(list_arg(kwargs, "keywords")?
        .iter()
        .all(|k| lower.contains(&k.to_lowercase())))
}

fn verify_sentence_count(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let count = SENTENCE_END
        .split(response)
        .filter(|s| !s.trim().is_empty())
        .count();
    count_check(kwargs, "num_sentences", count)
}

fn verify_paragraph_count(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let count = response
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .count();
    count_check(kwargs, "num_paragraphs", count)
}

fn verify_uppercase(response: &str, _kwargs: &Map<String, Value>) -> VerifyResult {
    Ok(response == response.to_uppercase())
}

fn verify_lowercase(response: &str, _kwargs: &Map<String, Value>) -> VerifyResult {
    Ok(response == response.to_lowercase())
}

fn verify_starts_with(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let starter = str_arg(kwargs, "starter").unwrap_or("");
    Ok(response.trim().starts_with(starter))
}

fn verify_ends_with(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let ending = str_arg(kwargs, "ending").unwrap_or("");
    Ok(response.trim().ends_with(ending))
}

fn verify_repeat_prompt(response: &str, kwargs: &Map<String, Value>) -> VerifyResult {
    let prompt = str_arg(kwargs, "prompt_to_repeat")
        .or_else(|| str_arg(kwargs, "original_prompt"))
        .unwrap_or("")
        .trim();
    Ok(prompt.is_empty() || response.trim().starts_with(prompt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn check(id: &str, response: &str, args: Value) -> bool {
        check_instruction(id, response, &kwargs(args))
    }

    // ==== Conjunction Tests ====

    #[test]
    fn all_constraints_must_hold() {
        let instructions = vec![
            Instruction::new(
                "length_constraints:number_words",
                kwargs(json!({"relation": "at least", "num_words": 5})),
            ),
            Instruction::new(
                "keywords:forbidden_words",
                kwargs(json!({"forbidden_words": ["foo"]})),
            ),
        ];
        assert!(all_satisfied("bar baz qux quux corge", &instructions));
        assert!(!all_satisfied("foo bar", &instructions));
        assert_eq!(
            instruction_verdicts("foo bar", &instructions),
            vec![false, false]
        );
        assert_eq!(
            instruction_verdicts("foo bar baz qux quux", &instructions),
            vec![true, false]
        );
    }

    #[test]
    fn no_constraints_is_satisfied() {
        assert!(all_satisfied("anything", &[]));
    }

    #[test]
    fn unknown_instruction_gets_benefit_of_doubt() {
        assert!(check("detectable_content:postscript", "no ps here", json!({})));
    }

    #[test]
    fn prefix_dispatch_finds_verifier() {
        assert!(!check("detectable_format:no_comma_v2", "a, b", json!({})));
    }

    #[test]
    fn bad_argument_is_not_satisfied() {
        assert!(!check(
            "length_constraints:number_words",
            "one two",
            json!({"num_words": "many"})
        ));
        assert!(!check(
            "keywords:forbidden_words",
            "one two",
            json!({"forbidden_words": "foo"})
        ));
    }

    // ==== Length Tests ====

    #[test]
    fn word_count_relations() {
        let r = "one two three";
        assert!(check("length_constraints:number_words", r, json!({"relation": "at least", "num_words": 3})));
        assert!(!check("length_constraints:number_words", r, json!({"relation": "at least", "num_words": 4})));
        assert!(check("length_constraints:number_words", r, json!({"relation": "less than", "num_words": 3})));
        assert!(check("length_constraints:number_words", r, json!({"relation": "fewer than", "num_words": 5})));
        assert!(check("length_constraints:number_words", r, json!({"relation": "exactly", "num_words": "3"})));
        assert!(check("length_constraints:number_words", r, json!({"relation": "around", "num_words": 100})));
    }

    #[test]
    fn null_arguments_use_defaults() {
        assert!(check(
            "length_constraints:number_words",
            "",
            json!({"relation": null, "num_words": null, "keywords": null})
        ));
    }

    #[test]
    fn sentence_and_paragraph_counts() {
        let text = "First point. Second point! Third?";
        assert!(check("length_constraints:number_sentences", text, json!({"relation": "exactly", "num_sentences": 3})));
        let paras = "Para one.\n\nPara two.\n\n\n\nPara three.";
        assert!(check("length_constraints:number_paragraphs", paras, json!({"relation": "exactly", "num_paragraphs": 3})));
        assert!(!check("length_constraints:number_paragraphs", paras, json!({"relation": "at most", "num_paragraphs": 2})));
    }

    // ==== Format Tests ====

    #[test]
    fn json_format_accepts_fenced_json() {
        assert!(check("detectable_format:json_format", "```json\n{\"a\": 1}\n```", json!({})));
        assert!(check("detectable_format:json_format", " [1, 2] ", json!({})));
        assert!(!check("detectable_format:json_format", "Here is JSON: {\"a\": 1}", json!({})));
    }

    #[test]
    fn bullet_points_are_counted() {
        let text = "Intro\n- one\n* two\n  • three\nnot-a-bullet";
        assert!(check("detectable_format:number_bullet_lists", text, json!({"relation": "exactly", "num_bullets": 3})));
        assert!(!check("detectable_format:number_bullet_lists", text, json!({"num_bullets": 4})));
    }

    #[test]
    fn title_case_and_no_comma() {
        assert!(check("detectable_format:title_case", "The Quick (Brown) Fox", json!({})));
        assert!(!check("detectable_format:title_case", "The quick Fox", json!({})));
        assert!(check("detectable_format:no_comma", "no commas here", json!({})));
    }

    // ==== Keyword Tests ====

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(check("keywords:existence", "The TORT was proven", json!({"keywords": ["tort", "proven"]})));
        assert!(!check("keywords:include_keywords", "The tort", json!({"keywords": ["tort", "proven"]})));
        assert!(!check("keywords:forbidden_words", "A FOO bar", json!({"forbidden_words": ["foo"]})));
    }

    // ==== Case Tests ====

    #[test]
    fn case_constraints() {
        assert!(check("change_case:english_capital", "ALL CAPS 123!", json!({})));
        assert!(!check("change_case:english_capital", "Not caps", json!({})));
        assert!(check("change_case:english_lowercase", "all lower", json!({})));
    }

    #[test]
    fn capital_word_frequency_requires_uppercase_response() {
        let kwargs = json!({"capital_frequency": 2, "capital_relation": "at least"});
        assert!(!check(
            "change_case:capital_word_frequency",
            "THIS is VERY important",
            kwargs.clone()
        ));
        assert!(check(
            "change_case:capital_word_frequency",
            "THIS IS VERY IMPORTANT",
            kwargs
        ));
        assert!(!check("change_case:capital_word_frequency", "Mixed", json!({})));
    }

    // ==== Start/End Tests ====

    #[test]
    fn start_end_and_repeat() {
        assert!(check("startend:starter", "  My answer: yes", json!({"starter": "My answer"})));
        assert!(check("startend:end_checker", "done. Is there anything else? ", json!({"ending": "anything else?"})));
        assert!(check(
            "combination:repeat_prompt",
            "Write a poem. Roses are red",
            json!({"prompt_to_repeat": "Write a poem."})
        ));
        assert!(!check(
            "combination:repeat_prompt",
            "Roses are red",
            json!({"original_prompt": "Write a poem."})
        ));
        assert!(check("language:response_language", "Bonjour", json!({"language": "en"})));
    }
}
