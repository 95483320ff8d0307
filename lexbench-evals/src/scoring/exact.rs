//! Lenient exact-match scoring for short classification answers.

use regex::Regex;

/// Trim and lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Score a prediction against a label.
///
/// 1.0 when, after [`normalize`], the prediction equals the label, contains
/// it as a whole word, starts with it, or (for comma-separated multi-label
/// answers) contains every label as a whole word. An empty label never
/// matches.
pub fn exact_match(prediction: &str, ground_truth: &str) -> f64 {
    let gt = normalize(ground_truth);
    let pred = normalize(prediction);

    if gt.is_empty() {
        return 0.0;
    }
    if pred == gt || contains_word(&pred, &gt) || pred.starts_with(&gt) {
        return 1.0;
    }

    let labels: Vec<&str> = gt.split(',').map(str::trim).filter(|l| !l.is_empty()).collect();
    if labels.len() > 1 && labels.iter().all(|label| contains_word(&pred, label)) {
        return 1.0;
    }
    0.0
}

fn contains_word(haystack: &str, word: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(word)))
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_after_normalization() {
        assert_eq!(exact_match("  YES \n", "Yes"), 1.0);
        assert_eq!(exact_match("generic", "Generic"), 1.0);
    }

    #[test]
    fn label_as_whole_word_in_verbose_answer() {
        assert_eq!(exact_match("I think the answer is dismissed.", "dismissed"), 1.0);
        assert_eq!(exact_match("The mark is descriptive", "descriptive"), 1.0);
    }

    #[test]
    fn partial_word_inside_answer_does_not_match() {
        assert_eq!(exact_match("I know", "no"), 0.0);
        assert_eq!(exact_match("a noble cause", "no"), 0.0);
    }

    #[test]
    fn prediction_starting_with_label() {
        assert_eq!(exact_match("yes, because the clause applies", "yes"), 1.0);
        // Prefix match ignores word boundaries.
        assert_eq!(exact_match("yesterday", "yes"), 1.0);
    }

    #[test]
    fn multi_label_requires_every_label() {
        assert_eq!(
            exact_match("Both de facto merger and mere continuation apply", "mere continuation, de facto merger"),
            1.0
        );
        assert_eq!(
            exact_match("Only de facto merger", "mere continuation, de facto merger"),
            0.0
        );
    }

    #[test]
    fn wrong_answer_scores_zero() {
        assert_eq!(exact_match("No", "Yes"), 0.0);
        assert_eq!(exact_match("", "Yes"), 0.0);
    }

    #[test]
    fn empty_label_never_matches() {
        assert_eq!(exact_match("anything", ""), 0.0);
        assert_eq!(exact_match("", "  "), 0.0);
    }

    #[test]
    fn regex_metacharacters_in_label_are_literal() {
        assert_eq!(exact_match("see rule 3.2 here", "3.2"), 1.0);
        assert_eq!(exact_match("see rule 302 here", "3.2"), 0.0);
    }
}
