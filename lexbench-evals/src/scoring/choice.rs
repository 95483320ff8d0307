//! Multiple-choice letter extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Option labels, up to ten options.
pub const OPTION_LABELS: [char; 10] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

static ANSWER_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)answer\s*(?:is|:)?\s*([A-J])\b").expect("answer pattern is valid")
});

static LEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Ja-j])[).]").expect("marker pattern is valid"));

static STANDALONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-J])\b").expect("standalone pattern is valid"));

/// Pull the chosen option letter out of a response.
///
/// Strategies in order, first hit wins: the whole response is one letter;
/// an "answer is X" / "answer: X" phrase; a leading `X)` or `X.`; the first
/// standalone uppercase letter A-J.
pub fn extract_option_letter(text: &str) -> Option<char> {
    let text = text.trim();

    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let c = c.to_ascii_uppercase();
        if OPTION_LABELS.contains(&c) {
            return Some(c);
        }
    }

    [&*ANSWER_PHRASE, &*LEADING_MARKER, &*STANDALONE]
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_uppercase())
}

/// 1.0 when the extracted letter equals `answer`, else 0.0.
pub fn score_choice(prediction: &str, answer: char) -> f64 {
    match extract_option_letter(prediction) {
        Some(letter) if letter == answer.to_ascii_uppercase() => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_letter() {
        assert_eq!(extract_option_letter(" c "), Some('C'));
        assert_eq!(extract_option_letter("J"), Some('J'));
        assert_eq!(extract_option_letter("K"), None);
    }

    #[test]
    fn answer_phrase() {
        assert_eq!(extract_option_letter("The answer is C."), Some('C'));
        assert_eq!(extract_option_letter("Final answer: b"), Some('B'));
        assert_eq!(extract_option_letter("ANSWER IS d"), Some('D'));
    }

    #[test]
    fn leading_marker() {
        assert_eq!(extract_option_letter("C) because the statute applies"), Some('C'));
        assert_eq!(extract_option_letter("e. the tort claim fails"), Some('E'));
    }

    #[test]
    fn first_standalone_letter() {
        assert_eq!(extract_option_letter("I would pick option G here"), Some('I'));
        assert_eq!(extract_option_letter("Option G is right"), Some('G'));
    }

    #[test]
    fn nothing_found() {
        assert_eq!(extract_option_letter("banana"), None);
        assert_eq!(extract_option_letter(""), None);
    }

    #[test]
    fn cascade_prefers_answer_phrase_over_leading_letter() {
        assert_eq!(extract_option_letter("A) is wrong, the answer is B"), Some('B'));
    }

    #[test]
    fn scoring() {
        assert_eq!(score_choice("The answer is C.", 'C'), 1.0);
        assert_eq!(score_choice("The answer is C.", 'D'), 0.0);
        assert_eq!(score_choice("banana", 'A'), 0.0);
        assert_eq!(score_choice("b", 'B'), 1.0);
    }
}
