use std::collections::HashSet;

use rusqlite::Connection;

use crate::{
    Error,
    category::CategoryId,
    database_id::TransactionId,
    rule::{db::get_active_rules, matcher::compile_rules},
    user::UserID,
};

/// Describes which transactions should be used for a batch categorisation
/// operation.
pub enum CategorisationMode {
    /// Re-evaluate every transaction, replacing existing categories.
    FetchAll,
    /// Only evaluate transactions that have no category yet.
    FetchUncategorised,
}

/// Result of applying categorisation rules to transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorisationResult {
    /// Number of transactions that were assigned a category
    pub transactions_categorised: usize,
    /// Number of distinct categories applied
    pub categories_applied: usize,
}

impl CategorisationResult {
    /// Creates a new empty result with zero transactions processed and zero
    /// categories applied
    pub fn empty() -> Self {
        Self {
            transactions_categorised: 0,
            categories_applied: 0,
        }
    }
}

/// Apply the user's active rules to their transactions.
///
/// Each transaction gets the category of the first rule (in priority order)
/// whose pattern matches its description. Transactions that match no rule are
/// left untouched.
///
/// # Arguments
/// * `mode` - Specify which transactions to process.
/// * `user_id` - The owner whose rules and transactions are used.
/// * `connection` - Database connection
///
/// # Returns
/// Result containing statistics about the categorisation operation
///
/// # Errors
/// Returns an error if there are database errors during the operation
pub fn apply_rules_to_transactions(
    mode: CategorisationMode,
    user_id: UserID,
    connection: &Connection,
) -> Result<CategorisationResult, Error> {
    let rules = get_active_rules(user_id, connection)?;
    if rules.is_empty() {
        return Ok(CategorisationResult::empty());
    }

    let transactions = get_transactions_for_categorisation(mode, user_id, connection)?;
    if transactions.is_empty() {
        return Ok(CategorisationResult::empty());
    }

    // Compile the rule set once rather than once per transaction.
    let compiled_rules = compile_rules(&rules);

    let mut updates: Vec<(TransactionId, CategoryId)> = Vec::new();
    let mut applied_categories = HashSet::new();

    for (transaction_id, description) in &transactions {
        let matching_category = compiled_rules
            .iter()
            .find(|(_, regex, _)| regex.is_match(description))
            .map(|(_, _, category_id)| *category_id);

        if let Some(category_id) = matching_category {
            updates.push((*transaction_id, category_id));
            applied_categories.insert(category_id);
        }
    }

    let transactions_categorised = updates.len();
    batch_set_transaction_categories(updates, user_id, connection)?;

    tracing::info!(
        "Applied rules for user {user_id}: {} of {} transactions categorised with {} categories",
        transactions_categorised,
        transactions.len(),
        applied_categories.len()
    );

    Ok(CategorisationResult {
        transactions_categorised,
        categories_applied: applied_categories.len(),
    })
}

/// Get transaction IDs and descriptions for batch categorisation, optionally
/// filtering to uncategorised only.
///
/// # Errors
/// Returns an error if there are database errors during the operation
fn get_transactions_for_categorisation(
    mode: CategorisationMode,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<(TransactionId, String)>, Error> {
    let query = match mode {
        CategorisationMode::FetchAll => {
            "SELECT id, description FROM \"transaction\" WHERE user_id = ?1"
        }
        CategorisationMode::FetchUncategorised => {
            "SELECT id, description FROM \"transaction\" WHERE user_id = ?1 AND category_id IS NULL"
        }
    };

    connection
        .prepare(query)?
        .query_map((user_id.as_i64(),), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Batch set categories for multiple transactions, replacing any existing
/// categories.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if any `category_id` does not refer to a valid category,
/// - [Error::SqlError] if there is some other SQL error.
fn batch_set_transaction_categories(
    transaction_category_pairs: Vec<(TransactionId, CategoryId)>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    if transaction_category_pairs.is_empty() {
        return Ok(());
    }

    let mut stmt = connection.prepare(
        "UPDATE \"transaction\" SET category_id = ?2 WHERE id = ?1 AND user_id = ?3",
    )?;

    for (transaction_id, category_id) in &transaction_category_pairs {
        stmt.execute((transaction_id, category_id, user_id.as_i64()))
            .map_err(|error| match error {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error {
                        code: _,
                        extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                    },
                    _,
                ) => Error::InvalidCategory(Some(*category_id)),
                error => error.into(),
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod auto_categorise_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{Category, CategoryName, create_category},
        db::initialize,
        rule::{db::create_rule, models::Rule},
        transaction::{Transaction, create_transaction, get_transaction},
        user::{User, create_user},
    };

    use super::{CategorisationMode, apply_rules_to_transactions};

    fn get_test_db_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialise database");
        let user = create_user("test", &connection).expect("Could not create test user");

        (connection, user)
    }

    fn make_category(name: &str, user: &User, connection: &Connection) -> Category {
        create_category(CategoryName::new_unchecked(name), None, user.id, connection)
            .expect("Could not create test category")
    }

    #[test]
    fn no_rules_returns_zero_results() {
        let (connection, user) = get_test_db_connection();
        let today = date!(2025 - 10 - 05);
        create_transaction(
            Transaction::build(100.0, today, "starbucks coffee"),
            user.id,
            &connection,
        )
        .unwrap();

        let result =
            apply_rules_to_transactions(CategorisationMode::FetchAll, user.id, &connection)
                .unwrap();

        assert_eq!(result.transactions_categorised, 0);
        assert_eq!(result.categories_applied, 0);
    }

    #[test]
    fn no_transactions_returns_zero_results() {
        let (connection, user) = get_test_db_connection();
        let category = make_category("Coffee", &user, &connection);
        create_rule(Rule::build("starbucks", category.id), user.id, &connection).unwrap();

        let result =
            apply_rules_to_transactions(CategorisationMode::FetchAll, user.id, &connection)
                .unwrap();

        assert_eq!(result.transactions_categorised, 0);
        assert_eq!(result.categories_applied, 0);
    }

    #[test]
    fn applies_matching_rules() {
        let (connection, user) = get_test_db_connection();
        let today = date!(2025 - 10 - 05);
        let coffee = make_category("Coffee", &user, &connection);
        let groceries = make_category("Groceries", &user, &connection);
        create_rule(Rule::build("starbucks", coffee.id), user.id, &connection).unwrap();
        create_rule(Rule::build("supermarket", groceries.id), user.id, &connection).unwrap();

        let tx1 = create_transaction(
            Transaction::build(100.0, today, "starbucks downtown"),
            user.id,
            &connection,
        )
        .unwrap();
        let tx2 = create_transaction(
            Transaction::build(50.0, today, "supermarket shopping"),
            user.id,
            &connection,
        )
        .unwrap();
        let tx3 = create_transaction(
            Transaction::build(25.0, today, "petrol station"),
            user.id,
            &connection,
        )
        .unwrap(); // No matching rule

        let result =
            apply_rules_to_transactions(CategorisationMode::FetchAll, user.id, &connection)
                .unwrap();

        assert_eq!(result.transactions_categorised, 2);
        assert_eq!(result.categories_applied, 2);

        let got_tx1 = get_transaction(tx1.id, user.id, &connection).unwrap();
        let got_tx2 = get_transaction(tx2.id, user.id, &connection).unwrap();
        let got_tx3 = get_transaction(tx3.id, user.id, &connection).unwrap();

        assert_eq!(got_tx1.category_id, Some(coffee.id));
        assert_eq!(got_tx2.category_id, Some(groceries.id));
        assert_eq!(got_tx3.category_id, None);
    }

    #[test]
    fn uncategorised_only_mode_leaves_categorised_rows_alone() {
        let (connection, user) = get_test_db_connection();
        let today = date!(2025 - 10 - 05);
        let coffee = make_category("Coffee", &user, &connection);
        let existing = make_category("Existing", &user, &connection);
        create_rule(Rule::build("starbucks", coffee.id), user.id, &connection).unwrap();

        let tx1 = create_transaction(
            Transaction::build(100.0, today, "starbucks cafe").category_id(Some(existing.id)),
            user.id,
            &connection,
        )
        .unwrap();
        let tx2 = create_transaction(
            Transaction::build(50.0, today, "starbucks downtown"),
            user.id,
            &connection,
        )
        .unwrap();

        let result = apply_rules_to_transactions(
            CategorisationMode::FetchUncategorised,
            user.id,
            &connection,
        )
        .unwrap();

        assert_eq!(result.transactions_categorised, 1);
        assert_eq!(result.categories_applied, 1);

        let got_tx1 = get_transaction(tx1.id, user.id, &connection).unwrap();
        let got_tx2 = get_transaction(tx2.id, user.id, &connection).unwrap();

        assert_eq!(got_tx1.category_id, Some(existing.id));
        assert_eq!(got_tx2.category_id, Some(coffee.id));
    }

    #[test]
    fn higher_priority_rule_wins() {
        let (connection, user) = get_test_db_connection();
        let today = date!(2025 - 10 - 05);
        let dining = make_category("Dining", &user, &connection);
        let coffee = make_category("Coffee", &user, &connection);
        create_rule(
            Rule::build("starbucks", dining.id).priority(1),
            user.id,
            &connection,
        )
        .unwrap();
        create_rule(
            Rule::build("coffee", coffee.id).priority(5),
            user.id,
            &connection,
        )
        .unwrap();

        let tx = create_transaction(
            Transaction::build(100.0, today, "Starbucks Coffee #123"),
            user.id,
            &connection,
        )
        .unwrap();

        apply_rules_to_transactions(CategorisationMode::FetchAll, user.id, &connection).unwrap();

        let got = get_transaction(tx.id, user.id, &connection).unwrap();
        assert_eq!(got.category_id, Some(coffee.id));
    }

    #[test]
    fn only_the_owners_transactions_are_touched() {
        let (connection, user) = get_test_db_connection();
        let other_user = create_user("other", &connection).unwrap();
        let today = date!(2025 - 10 - 05);
        let coffee = make_category("Coffee", &user, &connection);
        create_rule(Rule::build("starbucks", coffee.id), user.id, &connection).unwrap();

        let other_tx = create_transaction(
            Transaction::build(10.0, today, "starbucks downtown"),
            other_user.id,
            &connection,
        )
        .unwrap();

        let result =
            apply_rules_to_transactions(CategorisationMode::FetchAll, user.id, &connection)
                .unwrap();

        assert_eq!(result.transactions_categorised, 0);
        let got = get_transaction(other_tx.id, other_user.id, &connection).unwrap();
        assert_eq!(got.category_id, None);
    }
}
