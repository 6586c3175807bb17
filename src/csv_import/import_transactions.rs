//! Inserts bulk-imported transactions, classifying them on the way in.

use rusqlite::Connection;

use crate::{
    Error,
    category::get_categories,
    csv_import::{classifier::classify_description, csv::parse_csv},
    transaction::{Transaction, TransactionBuilder, map_transaction_row},
    user::UserID,
};

/// The outcome of a bulk import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    /// The transactions that were inserted. Rows whose import IDs already
    /// existed are not included.
    pub transactions: Vec<Transaction>,
    /// How many of the inserted transactions were assigned a category by the
    /// keyword classifier.
    pub classified: usize,
}

/// Parse a CSV statement export and import its transactions for `user_id`.
///
/// Runs inside a single SQL transaction: either every new row is imported or
/// none are.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCSV] if the CSV data cannot be parsed,
/// - [Error::SqlError] if there is an SQL error.
pub fn import_csv(
    text: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<ImportResult, Error> {
    let builders = parse_csv(text)?;

    let sql_transaction = connection.unchecked_transaction()?;
    let result = import_transaction_list(builders, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    tracing::info!(
        "Imported {} transaction(s) for user {user_id}, {} classified by keyword",
        result.transactions.len(),
        result.classified
    );

    Ok(result)
}

/// Import many transactions for `user_id`.
///
/// Rows with import IDs that already exist in the database are skipped, so an
/// overlapping statement can be imported safely. Rows that arrive without a
/// category are run through the keyword classifier against the user's
/// categories.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn import_transaction_list(
    builders: Vec<TransactionBuilder>,
    user_id: UserID,
    connection: &Connection,
) -> Result<ImportResult, Error> {
    let categories = get_categories(user_id, connection)?;

    let mut imported_transactions = Vec::new();
    let mut classified = 0;

    // Prepare the insert statement once for reuse
    let mut stmt = connection.prepare(
        "INSERT INTO \"transaction\" (amount, direction, date, description, import_id, category_id, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(import_id) DO NOTHING
         RETURNING id, amount, direction, date, description, import_id, category_id, user_id",
    )?;

    for mut builder in builders {
        if builder.category_id.is_none() {
            builder.category_id = classify_description(&builder.description, &categories);
        }

        let insert_result = stmt.query_row(
            (
                builder.amount,
                builder.direction.as_str(),
                builder.date,
                builder.description,
                builder.import_id,
                builder.category_id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        );

        match insert_result {
            Ok(transaction) => {
                if transaction.category_id.is_some() {
                    classified += 1;
                }
                imported_transactions.push(transaction);
            }
            // The import ID already exists: DO NOTHING means no row comes back.
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(error) => return Err(error.into()),
        }
    }

    Ok(ImportResult {
        transactions: imported_transactions,
        classified,
    })
}
