//! Name Similarity Scorer
//!
//! Combines three string measures on normalized names into one score:
//!
//! | Measure            | Weight | Insensitive to             |
//! |--------------------|--------|----------------------------|
//! | ratio              | 0.2    | nothing (raw indel ratio)  |
//! | token-sort ratio   | 0.4    | word order                 |
//! | token-set ratio    | 0.4    | repeated or extra words    |
//!
//! Every measure is symmetric and bounded in 0-100, so the composite is
//! too. Two empty names score 0: emptiness is never a match signal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const RATIO_WEIGHT: f64 = 0.2;
const TOKEN_SORT_WEIGHT: f64 = 0.4;
const TOKEN_SET_WEIGHT: f64 = 0.4;

/// Per-measure breakdown of a name comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub ratio: f64,
    pub token_sort: f64,
    pub token_set: f64,
    /// Weighted sum, rounded to the nearest integer
    pub composite: u8,
}

/// Composite similarity (0-100) of two normalized names
pub fn similarity(a: &str, b: &str) -> u8 {
    breakdown(a, b).composite
}

/// Compute every measure and the weighted composite
pub fn breakdown(a: &str, b: &str) -> SimilarityBreakdown {
    let ratio = ratio(a, b);
    let token_sort = token_sort_ratio(a, b);
    let token_set = token_set_ratio(a, b);

    let weighted =
        ratio * RATIO_WEIGHT + token_sort * TOKEN_SORT_WEIGHT + token_set * TOKEN_SET_WEIGHT;

    SimilarityBreakdown {
        ratio,
        token_sort,
        token_set,
        composite: weighted.round().clamp(0.0, 100.0) as u8,
    }
}

/// Indel ratio scaled to 0-100
///
/// `2 * lcs / (len_a + len_b)` over characters, so only insertions and
/// deletions count; a substitution costs two edits.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    200.0 * lcs_length(&a, &b) as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programme
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Ratio of both names with their tokens sorted, ignoring word order
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Ratio built around the shared token set, ignoring repeated and extra words
///
/// With `I` the sorted intersection and `A`, `B` the sorted differences,
/// returns the best of `ratio(I, I+A)`, `ratio(I, I+B)` and `ratio(I+A, I+B)`.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = join_nonempty(&intersection, &only_a);
    let combined_b = join_nonempty(&intersection, &only_b);

    ratio(&intersection, &combined_a)
        .max(ratio(&intersection, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join<'a>(tokens: impl Iterator<Item = &'a &'a str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}
