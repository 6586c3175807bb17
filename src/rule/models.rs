use serde::{Deserialize, Serialize};

use crate::{category::CategoryId, user::UserID};

/// Database identifier for a rule.
pub type RuleId = i64;

/// A rule that automatically assigns a category to transactions whose
/// descriptions match a regular expression. Patterns are matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// The ID of the rule.
    pub id: RuleId,

    /// A human readable label for the rule.
    pub name: String,

    /// The regular expression that transaction descriptions are tested
    /// against (case-insensitive).
    pub pattern: String,

    /// The ID of the category to apply when this rule matches.
    pub category_id: CategoryId,

    /// Rules with a higher priority are evaluated first. Ties are broken by
    /// creation order.
    pub priority: i64,

    /// Inactive rules are kept in the database but excluded from matching.
    pub is_active: bool,

    /// The user that owns this rule.
    pub user_id: UserID,
}

impl Rule {
    /// Create a new rule.
    ///
    /// Shortcut for [RuleBuilder] for discoverability.
    pub fn build(pattern: &str, category_id: CategoryId) -> RuleBuilder {
        RuleBuilder {
            name: None,
            pattern: pattern.to_owned(),
            category_id,
            priority: 0,
            is_active: true,
        }
    }
}

/// A builder for creating [Rule] instances.
///
/// Provides sensible defaults for everything except the pattern and target
/// category. Pass the finished builder to [crate::create_rule] or
/// [crate::upsert_rule] to persist the rule.
#[derive(Debug, PartialEq, Clone)]
pub struct RuleBuilder {
    /// A human readable label for the rule. Defaults to the pattern itself.
    pub name: Option<String>,

    /// The regular expression that transaction descriptions are tested
    /// against (case-insensitive).
    pub pattern: String,

    /// The ID of the category to apply when this rule matches.
    pub category_id: CategoryId,

    /// Rules with a higher priority are evaluated first. Defaults to 0.
    pub priority: i64,

    /// Whether the rule takes part in matching. Defaults to true.
    pub is_active: bool,
}

impl RuleBuilder {
    /// Set the human readable label for the rule.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Set the priority for the rule.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set whether the rule takes part in matching.
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}
