//! Seeded sampling shared by every benchmark.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// RNG seeded for reproducible sampling.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draw up to `amount` distinct elements without replacement.
///
/// Asking for more than `items.len()` returns every element in random order.
pub fn sample<T: Clone>(rng: &mut StdRng, items: &[T], amount: usize) -> Vec<T> {
    let amount = amount.min(items.len());
    rand::seq::index::sample(rng, items.len(), amount)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sample() {
        let items: Vec<u32> = (0..100).collect();
        let a = sample(&mut seeded_rng(42), &items, 10);
        let b = sample(&mut seeded_rng(42), &items, 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn different_seed_differs() {
        let items: Vec<u32> = (0..1000).collect();
        let a = sample(&mut seeded_rng(1), &items, 20);
        let b = sample(&mut seeded_rng(2), &items, 20);
        assert_ne!(a, b);
    }

    #[test]
    fn no_duplicates_and_capped_at_len() {
        let items = vec!["a", "b", "c"];
        let mut picked = sample(&mut seeded_rng(7), &items, 10);
        assert_eq!(picked.len(), 3);
        picked.sort();
        assert_eq!(picked, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_input() {
        let items: Vec<u8> = Vec::new();
        assert!(sample(&mut seeded_rng(42), &items, 5).is_empty());
    }
}
