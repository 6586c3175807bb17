//! The learning loop that promotes repeated manual categorisations into
//! durable rules.
//!
//! When the user assigns or confirms a category, each significant word of the
//! transaction's description is checked against the user's other transactions
//! in that category. A word that keeps showing up is promoted into an
//! automatic rule, so the next transaction from the same merchant is
//! categorised without the user doing anything.

use rusqlite::Connection;

use crate::{
    Error,
    category::CategoryId,
    database_id::TransactionId,
    rule::{Rule, compile_pattern, upsert_rule},
    tokens::significant_tokens,
    transaction::{get_transaction, set_transaction_category},
    user::UserID,
};

/// How many of the user's other transactions in the category must contain a
/// token before it is promoted into a rule.
pub const PROMOTION_THRESHOLD: u32 = 3;

/// The priority assigned to automatically created rules.
///
/// Low, so that any rule the user writes by hand outranks the learned ones.
pub const AUTO_RULE_PRIORITY: i64 = 1;

/// Statistics about a single learning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionResult {
    /// Number of rules created or refreshed by this pass.
    pub rules_promoted: usize,
}

impl PromotionResult {
    fn empty() -> Self {
        Self { rules_promoted: 0 }
    }
}

/// Record a manual categorisation: write the category onto the transaction,
/// then learn from it.
///
/// This is the entry point for the "user confirmed or corrected a category"
/// action in the embedding application.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if `category_id` does not refer to a category owned by the user,
/// - [Error::UpdateMissingTransaction] if the transaction does not exist,
/// - [Error::SqlError] if there is some other SQL error.
pub fn apply_categorisation(
    transaction_id: TransactionId,
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<PromotionResult, Error> {
    set_transaction_category(transaction_id, Some(category_id), user_id, connection)?;

    learn_from_categorisation(transaction_id, category_id, user_id, connection)
}

/// Observe a manual category assignment and promote recurring description
/// tokens into rules.
///
/// For each significant token of the transaction's description, counts how
/// many of the user's *other* transactions in `category_id` contain that
/// token (case-insensitive substring). Tokens at or above
/// [PROMOTION_THRESHOLD] are upserted as rules named `Auto: <token>` with
/// [AUTO_RULE_PRIORITY].
///
/// Calling this repeatedly with the same inputs converges: the upsert is
/// keyed by `(user, pattern, category)`, so re-promotion refreshes the
/// existing rule instead of duplicating it.
///
/// A transaction that cannot be found (deleted out from under the request, or
/// owned by someone else) is a silent no-op, not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn learn_from_categorisation(
    transaction_id: TransactionId,
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<PromotionResult, Error> {
    let transaction = match get_transaction(transaction_id, user_id, connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Ok(PromotionResult::empty()),
        Err(error) => return Err(error),
    };

    let mut rules_promoted = 0;

    for token in significant_tokens(&transaction.description) {
        // A token with regex metacharacters (stray parentheses and the like)
        // cannot be stored as a pattern; skip it rather than fail the pass.
        if compile_pattern(&token).is_err() {
            tracing::debug!("Not promoting token {token:?}: not a valid pattern");
            continue;
        }

        let occurrences =
            count_token_occurrences(&token, category_id, transaction_id, user_id, connection)?;

        if occurrences >= PROMOTION_THRESHOLD {
            upsert_rule(
                Rule::build(&token, category_id)
                    .name(&format!("Auto: {token}"))
                    .priority(AUTO_RULE_PRIORITY),
                user_id,
                connection,
            )?;
            rules_promoted += 1;
        }
    }

    if rules_promoted > 0 {
        tracing::info!(
            "Promoted {rules_promoted} rule(s) for user {user_id} from transaction {transaction_id}"
        );
    }

    Ok(PromotionResult { rules_promoted })
}

/// Count the user's transactions in `category_id`, other than `exclude_id`,
/// whose descriptions contain `token` (case-insensitive).
fn count_token_occurrences(
    token: &str,
    category_id: CategoryId,
    exclude_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .prepare(
            "SELECT COUNT(id) FROM \"transaction\"
             WHERE user_id = ?1 AND category_id = ?2 AND id != ?3
               AND instr(lower(description), ?4) > 0",
        )?
        .query_row(
            (user_id.as_i64(), category_id, exclude_id, token),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod learning_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{Category, CategoryName, create_category},
        db::initialize,
        rule::get_rules,
        transaction::{Transaction, create_transaction, get_transaction},
        user::{User, create_user},
    };

    use super::{AUTO_RULE_PRIORITY, apply_categorisation, learn_from_categorisation};

    fn get_test_db_connection() -> (Connection, User, Category) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialise database");
        let user = create_user("test", &connection).expect("Could not create test user");
        let category = create_category(
            CategoryName::new_unchecked("Streaming"),
            None,
            user.id,
            &connection,
        )
        .expect("Could not create test category");

        (connection, user, category)
    }

    fn add_categorised(
        description: &str,
        category: &Category,
        user: &User,
        connection: &Connection,
    ) -> Transaction {
        create_transaction(
            Transaction::build(15.99, date!(2025 - 10 - 05), description)
                .category_id(Some(category.id)),
            user.id,
            connection,
        )
        .expect("Could not create test transaction")
    }

    #[test]
    fn recurring_token_is_promoted_into_a_rule() {
        let (connection, user, category) = get_test_db_connection();
        add_categorised("NETFLIX.COM subscription", &category, &user, &connection);
        add_categorised("Netflix.com monthly", &category, &user, &connection);
        add_categorised("NETFLIX.COM 0800 123", &category, &user, &connection);
        let confirmed = add_categorised("netflix.com renewal", &category, &user, &connection);

        let result =
            learn_from_categorisation(confirmed.id, category.id, user.id, &connection).unwrap();

        assert_eq!(result.rules_promoted, 1);

        let rules = get_rules(user.id, &connection).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "Auto: netflix.com");
        assert_eq!(rules[0].pattern, "netflix.com");
        assert_eq!(rules[0].category_id, category.id);
        assert_eq!(rules[0].priority, AUTO_RULE_PRIORITY);
        assert!(rules[0].is_active);
    }

    #[test]
    fn learning_is_idempotent() {
        let (connection, user, category) = get_test_db_connection();
        add_categorised("NETFLIX.COM subscription", &category, &user, &connection);
        add_categorised("Netflix.com monthly", &category, &user, &connection);
        add_categorised("NETFLIX.COM 0800 123", &category, &user, &connection);
        let confirmed = add_categorised("netflix.com renewal", &category, &user, &connection);

        for _ in 0..3 {
            learn_from_categorisation(confirmed.id, category.id, user.id, &connection).unwrap();
        }

        let rules = get_rules(user.id, &connection).unwrap();
        assert_eq!(rules.len(), 1, "repeated learning must not duplicate rules");
    }

    #[test]
    fn below_the_threshold_nothing_is_promoted() {
        let (connection, user, category) = get_test_db_connection();
        add_categorised("NETFLIX.COM subscription", &category, &user, &connection);
        add_categorised("Netflix.com monthly", &category, &user, &connection);
        let confirmed = add_categorised("netflix.com renewal", &category, &user, &connection);

        let result =
            learn_from_categorisation(confirmed.id, category.id, user.id, &connection).unwrap();

        assert_eq!(result.rules_promoted, 0);
        assert!(get_rules(user.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn missing_transaction_is_a_silent_no_op() {
        let (connection, user, category) = get_test_db_connection();

        let result = learn_from_categorisation(999, category.id, user.id, &connection).unwrap();

        assert_eq!(result.rules_promoted, 0);
        assert!(get_rules(user.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn learning_only_counts_the_owners_transactions() {
        let (connection, user, category) = get_test_db_connection();
        let other_user = create_user("other", &connection).unwrap();
        let other_category = create_category(
            CategoryName::new_unchecked("Streaming"),
            None,
            other_user.id,
            &connection,
        )
        .unwrap();

        // The other user has plenty of matching history; the owner has none.
        add_categorised("NETFLIX.COM a", &other_category, &other_user, &connection);
        add_categorised("NETFLIX.COM b", &other_category, &other_user, &connection);
        add_categorised("NETFLIX.COM c", &other_category, &other_user, &connection);
        let confirmed = add_categorised("netflix.com renewal", &category, &user, &connection);

        let result =
            learn_from_categorisation(confirmed.id, category.id, user.id, &connection).unwrap();

        assert_eq!(result.rules_promoted, 0);
        assert!(get_rules(user.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn apply_categorisation_writes_the_category_then_learns() {
        let (connection, user, category) = get_test_db_connection();
        add_categorised("Spotify P1234 subscription", &category, &user, &connection);
        add_categorised("Spotify P5678 monthly", &category, &user, &connection);
        add_categorised("SPOTIFY P9999", &category, &user, &connection);
        let uncategorised = create_transaction(
            Transaction::build(12.99, date!(2025 - 10 - 06), "spotify family plan"),
            user.id,
            &connection,
        )
        .unwrap();

        let result =
            apply_categorisation(uncategorised.id, category.id, user.id, &connection).unwrap();

        let got = get_transaction(uncategorised.id, user.id, &connection).unwrap();
        assert_eq!(got.category_id, Some(category.id));

        assert_eq!(result.rules_promoted, 1);
        let rules = get_rules(user.id, &connection).unwrap();
        assert_eq!(rules[0].pattern, "spotify");
    }
}
