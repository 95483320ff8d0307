//! Separation of hidden reasoning from visible answers.
//!
//! Thinking-capable local models wrap their chain of thought in
//! `<think>…</think>`. The visible answer is scored; the reasoning is only
//! counted.

use std::sync::LazyLock;

use regex::Regex;

use super::Message;

static THINK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>(.*?)</think>").expect("think-block pattern is valid")
});

/// Directive that switches Qwen3-style models into thinking mode.
pub const THINK_DIRECTIVE: &str = "/think\n";

/// Approximate characters per token for reasoning text.
const CHARS_PER_TOKEN: usize = 4;

/// Visible text and the approximate size of the removed reasoning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResponse {
    /// Response with every think block removed and trimmed.
    pub visible: String,
    /// Estimated tokens inside the think blocks.
    pub thinking_tokens: u64,
}

/// Strip think blocks and estimate their token count.
pub fn split_reasoning(raw: &str) -> SplitResponse {
    let thinking: Vec<&str> = THINK_BLOCK
        .captures_iter(raw)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let thinking_text = thinking.join(" ");
    let visible = THINK_BLOCK.replace_all(raw, "").trim().to_string();

    SplitResponse {
        visible,
        thinking_tokens: approx_tokens(&thinking_text),
    }
}

/// Rough token count at ~4 characters per token.
pub fn approx_tokens(text: &str) -> u64 {
    (text.chars().count() / CHARS_PER_TOKEN) as u64
}

/// Prefix the system turn with the thinking directive, adding one if absent.
pub fn inject_think_directive(messages: &[Message]) -> Vec<Message> {
    let mut out = messages.to_vec();
    if let Some(system) = out.iter_mut().find(|m| m.role == super::Role::System) {
        system.content = format!("{THINK_DIRECTIVE}{}", system.content);
    } else {
        out.insert(0, Message::system(THINK_DIRECTIVE));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;

    #[test]
    fn plain_response_is_untouched() {
        let split = split_reasoning("  Yes  ");
        assert_eq!(split.visible, "Yes");
        assert_eq!(split.thinking_tokens, 0);
    }

    #[test]
    fn think_block_is_removed_and_counted() {
        let raw = "<think>abcdefghijklmnop</think>\nThe answer is B.";
        let split = split_reasoning(raw);
        assert_eq!(split.visible, "The answer is B.");
        assert_eq!(split.thinking_tokens, 4);
    }

    #[test]
    fn multiple_blocks_across_lines_are_removed() {
        let raw = "<think>first\nline</think>A<think>second</think>";
        let split = split_reasoning(raw);
        assert_eq!(split.visible, "A");
        // "first\nline second" is 17 chars
        assert_eq!(split.thinking_tokens, 4);
    }

    #[test]
    fn directive_prefixes_existing_system_message() {
        let msgs = vec![Message::system("Be terse."), Message::user("Hi")];
        let out = inject_think_directive(&msgs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].content, "/think\nBe terse.");
        assert_eq!(msgs[0].content, "Be terse.");
    }

    #[test]
    fn directive_inserts_system_message_when_absent() {
        let out = inject_think_directive(&[Message::user("Hi")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].role, Role::System);
        assert_eq!(out[0].content, THINK_DIRECTIVE);
    }
}
