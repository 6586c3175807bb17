//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    database_id::{DatabaseId, TransactionId},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money entered or left the account.
///
/// Amounts are stored as non-negative magnitudes; the direction carries the
/// sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Direction {
    /// Money entered the account, e.g. salary, a refund.
    Credit,
    /// Money left the account, e.g. a purchase, a bill payment.
    Debit,
}

impl Direction {
    /// The string stored in the database for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }
}

fn parse_direction(value: &str) -> Result<Direction, rusqlite::Error> {
    match value {
        "credit" => Ok(Direction::Credit),
        "debit" => Ok(Direction::Debit),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown transaction direction \"{other}\"").into(),
        )),
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The amount of money spent or earned in this transaction, as a
    /// non-negative magnitude.
    pub amount: f64,
    /// Whether the amount was spent or earned.
    pub direction: Direction,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the import that this transaction belongs to.
    pub import_id: Option<i64>,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The user that owns this transaction.
    pub user_id: UserID,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            direction: Direction::Debit,
            date,
            description: description.to_owned(),
            import_id: None,
            category_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// This builder allows you to construct transactions step by step, providing
/// sensible defaults for optional fields. Pass the finished builder to
/// [create_transaction] to insert the transaction.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction as a non-negative magnitude.
    pub amount: f64,

    /// Whether the amount was spent or earned. Defaults to [Direction::Debit]
    /// since most rows in a bank statement are spending.
    pub direction: Direction,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    ///
    /// For imported transactions, this typically comes from the bank's
    /// description field, e.g. `"POS W/D LOBSTER SEAFOO-19:47"`.
    pub description: String,

    /// Optional unique identifier for imported transactions.
    ///
    /// The database enforces uniqueness on this field so that importing the
    /// same statement twice does not duplicate transactions. Typically
    /// generated with [crate::csv_import::parse_csv] from the raw CSV record.
    pub import_id: Option<i64>,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the direction for the transaction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the import ID for the transaction.
    pub fn import_id(mut self, import_id: Option<i64>) -> Self {
        self.import_id = import_id;
        self
    }

    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the builder's amount is negative,
/// - [Error::InvalidCategory] if the specified category ID does not refer to
///   a category owned by the user,
/// - [Error::InvalidUser] if `user_id` does not refer to a valid user,
/// - [Error::DuplicateImportId] if a transaction with the specified import ID already exists,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if builder.amount < 0.0 {
        return Err(Error::NegativeAmount(builder.amount));
    }

    check_category_ownership(builder.category_id, user_id, connection)?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, direction, date, description, import_id, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, amount, direction, date, description, import_id, category_id, user_id",
        )?
        .query_row(
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
        )
        .map_err(|error| match error {
            // The category was checked above, so the failing foreign key is the user.
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidUser,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateImportId,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, amount, direction, date, description, import_id, category_id, user_id
             FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's transactions that have been assigned a
/// category.
///
/// This is the history that the similarity scorer and the learning promoter
/// work from.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_categorised_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, direction, date, description, import_id, category_id, user_id
             FROM \"transaction\"
             WHERE user_id = ?1 AND category_id IS NOT NULL
             ORDER BY id ASC",
        )?
        .query_map((user_id.as_i64(),), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Set or clear the category of a transaction owned by `user_id`.
///
/// This is the only transaction column the categorisation engine writes.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if `category_id` does not refer to a valid category,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn set_transaction_category(
    id: TransactionId,
    category_id: Option<CategoryId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    check_category_ownership(category_id, user_id, connection)?;

    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\" SET category_id = ?2 WHERE id = ?1 AND user_id = ?3",
            (id, category_id, user_id.as_i64()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(category_id),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Check that `category_id`, if set, refers to a category owned by `user_id`.
fn check_category_ownership(
    category_id: Option<CategoryId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match category_id {
        Some(category_id) => {
            crate::category::check_category_ownership(category_id, user_id, connection)
        }
        None => Ok(()),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                direction TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                import_id INTEGER UNIQUE,
                category_id INTEGER,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the similarity scorer and the learning promoter.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_category
         ON \"transaction\"(user_id, category_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let raw_direction: String = row.get(2)?;
    let date = row.get(3)?;
    let description = row.get(4)?;
    let import_id = row.get(5)?;
    let category_id = row.get(6)?;
    let raw_user_id = row.get(7)?;

    Ok(Transaction {
        id,
        amount,
        direction: parse_direction(&raw_direction)?,
        date,
        description,
        import_id,
        category_id,
        user_id: UserID::new(raw_user_id),
    })
}

// ============================================================================
// TESTS
// ============================================================================
