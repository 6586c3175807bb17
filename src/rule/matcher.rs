//! First-match rule evaluation over transaction descriptions.

use regex::{Regex, RegexBuilder};

use crate::{
    Error,
    category::CategoryId,
    rule::models::{Rule, RuleId},
};

/// Compile a rule pattern as a case-insensitive regular expression.
///
/// Rule creation and updates call this to give the user early feedback on a
/// bad pattern. The matcher itself never propagates the error: patterns are
/// user-supplied and a single bad rule must not break matching for the rest.
///
/// # Errors
/// This function will return an [Error::InvalidPattern] if the pattern is not
/// a valid regular expression.
pub fn compile_pattern(pattern: &str) -> Result<Regex, Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|error| Error::InvalidPattern(pattern.to_owned(), error.to_string()))
}

/// Return the category of the first active rule whose pattern matches
/// `description`, or `None` if no rule matches.
///
/// Rules are evaluated in the order given; callers get priority ordering by
/// fetching rules with [crate::rule::get_active_rules]. Rules whose patterns
/// fail to compile are skipped with a warning.
pub fn match_rules(description: &str, rules: &[Rule]) -> Option<CategoryId> {
    compile_rules(rules)
        .iter()
        .find(|(_, regex, _)| regex.is_match(description))
        .map(|(_, _, category_id)| *category_id)
}

/// Compile the active rules in `rules`, preserving order and dropping rules
/// whose patterns fail to compile.
///
/// Batch callers use this to compile the rule set once instead of once per
/// transaction.
pub(crate) fn compile_rules(rules: &[Rule]) -> Vec<(RuleId, Regex, CategoryId)> {
    rules
        .iter()
        .filter(|rule| rule.is_active)
        .filter_map(|rule| match compile_pattern(&rule.pattern) {
            Ok(regex) => Some((rule.id, regex, rule.category_id)),
            Err(error) => {
                tracing::warn!("Skipping rule {} ({}): {error}", rule.id, rule.name);
                None
            }
        })
        .collect()
}
