//! Word-overlap similarity between transaction descriptions.

use std::collections::{HashMap, HashSet};

use crate::{
    category::CategoryId,
    tokens::{is_significant, tokenise},
    transaction::Transaction,
};

/// Minimum similarity for a historical transaction to contribute to a
/// category's score.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Compute the word-overlap similarity between two descriptions.
///
/// The similarity is the number of significant tokens (longer than three
/// characters) that appear in both descriptions, divided by the size of the
/// larger token set. Bank descriptions are short and noisy; requiring the
/// shared words to be significant keeps "POS W/D" lines from looking like
/// each other.
///
/// Returns a value in `0.0..=1.0`; `0.0` when either description has no
/// tokens.
pub fn description_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<String> = tokenise(a).into_iter().collect();
    let tokens_b: HashSet<String> = tokenise(b).into_iter().collect();

    let larger = tokens_a.len().max(tokens_b.len());
    if larger == 0 {
        return 0.0;
    }

    let common = tokens_a
        .intersection(&tokens_b)
        .filter(|token| is_significant(token))
        .count();

    common as f64 / larger as f64
}

/// Score categories by how similar their past transactions are to
/// `description`.
///
/// Every historical transaction whose description is more than
/// [SIMILARITY_THRESHOLD] similar adds its similarity to the running total of
/// its category, so a category backed by many similar transactions outranks
/// one backed by a single lucky overlap. Transactions without a category are
/// excluded.
pub fn score_categories(
    description: &str,
    history: &[Transaction],
) -> HashMap<CategoryId, f64> {
    let mut scores = HashMap::new();

    for transaction in history {
        let Some(category_id) = transaction.category_id else {
            continue;
        };

        let similarity = description_similarity(description, &transaction.description);

        if similarity > SIMILARITY_THRESHOLD {
            *scores.entry(category_id).or_insert(0.0) += similarity;
        }
    }

    scores
}
