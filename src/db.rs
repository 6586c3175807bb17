//! Database schema initialisation.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, category::create_category_table, rule::create_rule_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create all of the tables used by the categorisation engine.
///
/// The tables are created inside a single exclusive transaction so that a
/// partially initialised schema is never left behind.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_rule_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
