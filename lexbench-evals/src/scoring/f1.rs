//! SQuAD-style token F1.

use std::collections::HashMap;

/// Lowercase, drop ASCII punctuation and the articles a/an/the.
pub fn normalize_answer(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    lowered
        .split_whitespace()
        .filter(|t| !matches!(*t, "a" | "an" | "the"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-level F1 between a prediction and one reference, rounded to four
/// decimals.
///
/// Both empty after normalization is a perfect match; exactly one empty
/// scores zero.
pub fn compute_f1(prediction: &str, ground_truth: &str) -> f64 {
    let pred = normalize_answer(prediction);
    let gt = normalize_answer(ground_truth);
    let pred_tokens: Vec<&str> = pred.split_whitespace().collect();
    let gt_tokens: Vec<&str> = gt.split_whitespace().collect();

    match (pred_tokens.is_empty(), gt_tokens.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in &gt_tokens {
        *counts.entry(*t).or_default() += 1;
    }
    let mut common = 0usize;
    for t in &pred_tokens {
        if let Some(n) = counts.get_mut(t)
            && *n > 0
        {
            *n -= 1;
            common += 1;
        }
    }
    if common == 0 {
        return 0.0;
    }

    let precision = common as f64 / pred_tokens.len() as f64;
    let recall = common as f64 / gt_tokens.len() as f64;
    round4(2.0 * precision * recall / (precision + recall))
}

/// Best F1 over all acceptable references; 0.0 when there are none.
pub fn best_f1<S: AsRef<str>>(prediction: &str, references: &[S]) -> f64 {
    references
        .iter()
        .map(|r| compute_f1(prediction, r.as_ref()))
        .fold(0.0, f64::max)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_case_punctuation_and_articles() {
        assert_eq!(normalize_answer("The Licensee, an Affiliate!"), "licensee affiliate");
        assert_eq!(normalize_answer("  A  "), "");
    }

    #[test]
    fn both_empty_is_perfect() {
        assert_eq!(compute_f1("", ""), 1.0);
        assert_eq!(compute_f1("the", "a ."), 1.0);
    }

    #[test]
    fn one_empty_is_zero() {
        assert_eq!(compute_f1("x", ""), 0.0);
        assert_eq!(compute_f1("", "x"), 0.0);
    }

    #[test]
    fn identical_text_is_perfect() {
        let clause = "Licensor shall indemnify Licensee against all claims.";
        assert_eq!(compute_f1(clause, clause), 1.0);
    }

    #[test]
    fn partial_overlap() {
        // pred 4 tokens, gt 2 tokens, 2 shared: p=0.5 r=1.0 f1=0.6667
        assert_eq!(compute_f1("shall not compete anywhere", "not compete"), 0.6667);
    }

    #[test]
    fn repeated_tokens_use_multiset_intersection() {
        // pred "audit audit" vs gt "audit": common=1, p=0.5, r=1 → 0.6667
        assert_eq!(compute_f1("audit audit", "audit"), 0.6667);
    }

    #[test]
    fn disjoint_is_zero() {
        assert_eq!(compute_f1("termination", "indemnification"), 0.0);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let samples = ["", "a", "x y z", "x x x", "the quick brown fox", "fox"];
        for a in samples {
            for b in samples {
                let f = compute_f1(a, b);
                assert!((0.0..=1.0).contains(&f), "f1({a:?}, {b:?}) = {f}");
            }
        }
    }

    #[test]
    fn best_f1_takes_maximum() {
        let refs = ["unrelated text", "right to audit the books"];
        assert_eq!(best_f1("right to audit the books", &refs), 1.0);
        assert_eq!(best_f1::<&str>("anything", &[]), 0.0);
    }
}
