//! User-defined rules for automatically categorising transactions.
//!
//! A rule pairs a regular expression with a target category. Rules are
//! evaluated against transaction descriptions in priority order and the
//! first active match wins. Rules are written by the user directly, or by the
//! learning promoter when a manual categorisation keeps recurring.

mod auto_categorise;
mod db;
mod matcher;
mod models;

pub use auto_categorise::{
    CategorisationMode, CategorisationResult, apply_rules_to_transactions,
};
pub use db::{
    create_rule, create_rule_table, delete_rule, get_active_rules, get_rule, get_rules,
    update_rule, upsert_rule,
};
pub use matcher::{compile_pattern, match_rules};
pub use models::{Rule, RuleBuilder, RuleId};
