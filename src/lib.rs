//! Categoriser is the transaction categorisation engine for a personal
//! budgeting app.
//!
//! It decides which category a bank transaction belongs to, three ways:
//! - user-defined rules whose regular expression patterns are matched against
//!   transaction descriptions in priority order,
//! - word-overlap similarity against the user's previously categorised
//!   transactions, combined with rule matches into a ranked suggestion list,
//! - a fixed keyword table used to give bulk-imported transactions a starting
//!   category before the user has built any rules.
//!
//! The engine also learns: when the user manually assigns or confirms a
//! category, recurring description words are promoted into durable rules via
//! [learn_from_categorisation].
//!
//! The embedding application owns authentication, HTTP, and rendering; this
//! library only needs a [rusqlite::Connection] and a [UserID].

#![warn(missing_docs)]

mod category;
mod csv_import;
mod database_id;
mod db;
mod learning;
mod rule;
mod suggestion;
mod tokens;
mod transaction;
mod user;

pub use category::{
    Category, CategoryId, CategoryName, CategoryRole, create_category, get_categories,
    get_category, get_category_by_name, get_fallback_category,
};
pub use csv_import::{
    ImportResult, classify_description, import_csv, import_transaction_list, parse_csv,
};
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use learning::{
    AUTO_RULE_PRIORITY, PROMOTION_THRESHOLD, PromotionResult, apply_categorisation,
    learn_from_categorisation,
};
pub use rule::{
    CategorisationMode, CategorisationResult, Rule, RuleBuilder, RuleId,
    apply_rules_to_transactions, compile_pattern, create_rule, delete_rule, get_active_rules,
    get_rule, get_rules, match_rules, update_rule, upsert_rule,
};
pub use suggestion::{
    RULE_MATCH_CONFIDENCE, SIMILARITY_CONFIDENCE_CAP, SIMILARITY_THRESHOLD, Suggestion,
    SuggestionReason, description_similarity, score_categories, suggest_categories,
};
pub use transaction::{
    Direction, Transaction, TransactionBuilder, create_transaction,
    get_categorised_transactions, get_transaction, set_transaction_category,
};
pub use user::{User, UserID, create_user, get_user_by_id};

/// The errors that may occur in the library.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used as a rule pattern.
    #[error("rule pattern cannot be empty")]
    EmptyRulePattern,

    /// A rule pattern could not be compiled as a regular expression.
    ///
    /// Returned from rule creation and updates so the user gets early
    /// feedback. At match time invalid patterns are skipped instead.
    #[error("invalid rule pattern \"{0}\": {1}")]
    InvalidPattern(String, String),

    /// The category ID used for a transaction or rule did not match a valid
    /// category owned by the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A row referenced a user that does not exist in the database.
    #[error("the user ID does not refer to a valid user")]
    InvalidUser,

    /// A negative amount was used to create a transaction.
    ///
    /// Amounts are stored as non-negative magnitudes with a separate
    /// credit/debit direction.
    #[error("transaction amounts must not be negative, got {0}")]
    NegativeAmount(f64),

    /// The specified import ID already exists in the database.
    ///
    /// Import IDs uniquely identify transactions imported from CSV
    /// statements. Rejecting duplicates means the same statement can be
    /// imported twice without doubling up transactions.
    #[error("the import ID already exists in the database")]
    DuplicateImportId,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to update a rule that does not exist
    #[error("tried to update a rule that is not in the database")]
    UpdateMissingRule,

    /// Tried to delete a rule that does not exist
    #[error("tried to delete a rule that is not in the database")]
    DeleteMissingRule,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
