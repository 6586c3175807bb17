//! Category suggestions for new transactions.
//!
//! Combines two signals: the user's rules (exact, high confidence) and
//! word-overlap similarity against their previously categorised transactions
//! (fuzzy, capped confidence). The result is a ranked, deduplicated list for
//! the user to confirm or correct.

mod aggregator;
mod similarity;

pub use aggregator::{
    RULE_MATCH_CONFIDENCE, SIMILARITY_CONFIDENCE_CAP, Suggestion, SuggestionReason,
    suggest_categories,
};
pub use similarity::{SIMILARITY_THRESHOLD, description_similarity, score_categories};
