//! Combines rule matching and similarity scoring into a ranked suggestion
//! list.

use std::{cmp::Ordering, fmt::Display};

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    category::CategoryId,
    rule::{get_active_rules, match_rules},
    suggestion::similarity::score_categories,
    transaction::get_categorised_transactions,
    user::UserID,
};

/// Confidence assigned to a suggestion backed by a rule match.
///
/// Fixed above [SIMILARITY_CONFIDENCE_CAP] so that a rule match always
/// outranks a similarity match for the same category.
pub const RULE_MATCH_CONFIDENCE: f64 = 0.9;

/// Upper bound on the confidence of a similarity-derived suggestion.
pub const SIMILARITY_CONFIDENCE_CAP: f64 = 0.8;

/// At most this many similarity-derived suggestions are returned.
const MAX_SIMILARITY_SUGGESTIONS: usize = 3;

/// Why a category was suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuggestionReason {
    /// One of the user's rules matched the description.
    RuleMatch,
    /// Previously categorised transactions have similar descriptions.
    SimilarTransactions,
}

impl SuggestionReason {
    /// The provenance tag shown to the user.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionReason::RuleMatch => "rule match",
            SuggestionReason::SimilarTransactions => "similar transactions",
        }
    }
}

impl Display for SuggestionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ephemeral category proposal for a transaction, returned to the user for
/// confirmation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// The suggested category.
    pub category_id: CategoryId,
    /// How confident the engine is in this suggestion, in `0.0..=1.0`.
    pub confidence: f64,
    /// Where the suggestion came from.
    pub reason: SuggestionReason,
}

/// Suggest categories for a transaction description, most confident first.
///
/// The rule matcher runs first: a match becomes a suggestion with confidence
/// [RULE_MATCH_CONFIDENCE]. Then the similarity scorer runs over all of the
/// user's categorised transactions; the top three categories become
/// suggestions with confidence capped at [SIMILARITY_CONFIDENCE_CAP],
/// skipping the rule-matched category. The returned list therefore never
/// contains duplicate categories and has at most four entries.
///
/// A user with no rules and no categorised history gets an empty list; that
/// is data absence, not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn suggest_categories(
    description: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Suggestion>, Error> {
    let rules = get_active_rules(user_id, connection)?;
    let rule_category = match_rules(description, &rules);

    let mut suggestions = Vec::new();

    if let Some(category_id) = rule_category {
        suggestions.push(Suggestion {
            category_id,
            confidence: RULE_MATCH_CONFIDENCE,
            reason: SuggestionReason::RuleMatch,
        });
    }

    let history = get_categorised_transactions(user_id, connection)?;
    let scores = score_categories(description, &history);

    let mut ranked: Vec<(CategoryId, f64)> = scores.into_iter().collect();
    // Highest score first; equal scores fall back to category ID so the
    // ordering is deterministic.
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    for (category_id, score) in ranked.into_iter().take(MAX_SIMILARITY_SUGGESTIONS) {
        if Some(category_id) == rule_category {
            continue;
        }

        suggestions.push(Suggestion {
            category_id,
            confidence: score.min(SIMILARITY_CONFIDENCE_CAP),
            reason: SuggestionReason::SimilarTransactions,
        });
    }

    Ok(suggestions)
}
