use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::check_category_ownership,
    rule::{
        matcher::compile_pattern,
        models::{Rule, RuleBuilder, RuleId},
    },
    user::UserID,
};

/// Create a rule in the database.
///
/// The pattern is validated up front so the user gets feedback at creation
/// time instead of a silently dead rule at match time.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyRulePattern] if the pattern is empty or whitespace,
/// - [Error::InvalidPattern] if the pattern is not a valid regular expression,
/// - [Error::InvalidCategory] if the category does not belong to the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_rule(
    builder: RuleBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Rule, Error> {
    let builder = validate_builder(builder)?;
    check_category_ownership(builder.category_id, user_id, connection)?;

    connection
        .prepare(
            "INSERT INTO rule (name, pattern, category_id, priority, is_active, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, name, pattern, category_id, priority, is_active, user_id",
        )?
        .query_row(
            (
                builder.name.as_deref().unwrap_or(&builder.pattern),
                &builder.pattern,
                builder.category_id,
                builder.priority,
                builder.is_active,
                user_id.as_i64(),
            ),
            map_rule_row,
        )
        .map_err(|error| map_foreign_key_error(error, &builder))
}

/// Create or update a rule keyed by `(user_id, pattern, category_id)`.
///
/// If the user already has a rule with the same pattern and target category,
/// its name, priority, and active flag are overwritten in place instead of a
/// duplicate being created. This is the write half of the learning loop:
/// repeated promotion of the same token converges on a single rule.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyRulePattern] if the pattern is empty or whitespace,
/// - [Error::InvalidPattern] if the pattern is not a valid regular expression,
/// - [Error::InvalidCategory] if the category does not belong to the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn upsert_rule(
    builder: RuleBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Rule, Error> {
    let builder = validate_builder(builder)?;
    check_category_ownership(builder.category_id, user_id, connection)?;

    connection
        .prepare(
            "INSERT INTO rule (name, pattern, category_id, priority, is_active, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, pattern, category_id)
             DO UPDATE SET name = excluded.name,
                           priority = excluded.priority,
                           is_active = excluded.is_active
             RETURNING id, name, pattern, category_id, priority, is_active, user_id",
        )?
        .query_row(
            (
                builder.name.as_deref().unwrap_or(&builder.pattern),
                &builder.pattern,
                builder.category_id,
                builder.priority,
                builder.is_active,
                user_id.as_i64(),
            ),
            map_rule_row,
        )
        .map_err(|error| map_foreign_key_error(error, &builder))
}

/// Retrieve a rule owned by `user_id` by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `rule_id` does not refer to a rule owned by the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_rule(rule_id: RuleId, user_id: UserID, connection: &Connection) -> Result<Rule, Error> {
    connection
        .prepare(
            "SELECT id, name, pattern, category_id, priority, is_active, user_id
             FROM rule WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((rule_id, user_id.as_i64()), map_rule_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's rules, sorted for evaluation.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_rules(user_id: UserID, connection: &Connection) -> Result<Vec<Rule>, Error> {
    connection
        .prepare(
            "SELECT id, name, pattern, category_id, priority, is_active, user_id
             FROM rule WHERE user_id = ?1
             ORDER BY priority DESC, id ASC",
        )?
        .query_map((user_id.as_i64(),), map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's active rules in evaluation order: priority descending,
/// ties broken by creation order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_active_rules(user_id: UserID, connection: &Connection) -> Result<Vec<Rule>, Error> {
    connection
        .prepare(
            "SELECT id, name, pattern, category_id, priority, is_active, user_id
             FROM rule WHERE user_id = ?1 AND is_active = 1
             ORDER BY priority DESC, id ASC",
        )?
        .query_map((user_id.as_i64(),), map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Update a rule owned by `user_id` with the values from `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyRulePattern] if the new pattern is empty or whitespace,
/// - [Error::InvalidPattern] if the new pattern is not a valid regular expression,
/// - [Error::UpdateMissingRule] if `rule_id` does not refer to a rule owned by the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn update_rule(
    rule_id: RuleId,
    builder: RuleBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let builder = validate_builder(builder)?;
    check_category_ownership(builder.category_id, user_id, connection)?;

    let rows_affected = connection
        .execute(
            "UPDATE rule
             SET name = ?1, pattern = ?2, category_id = ?3, priority = ?4, is_active = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                builder.name.as_deref().unwrap_or(&builder.pattern),
                &builder.pattern,
                builder.category_id,
                builder.priority,
                builder.is_active,
                rule_id,
                user_id.as_i64(),
            ),
        )
        .map_err(|error| map_foreign_key_error(error, &builder))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRule);
    }

    Ok(())
}

/// Delete a rule owned by `user_id` from the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRule] if `rule_id` does not refer to a rule owned by the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_rule(rule_id: RuleId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM rule WHERE id = ?1 AND user_id = ?2",
        (rule_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    Ok(())
}

/// Create the rule table in the database.
///
/// The `UNIQUE(user_id, pattern, category_id)` constraint is the idempotence
/// key for [upsert_rule]: the learning promoter can re-promote the same token
/// any number of times without duplicating rules.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS rule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                pattern TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(user_id, pattern, category_id)
            );",
        (),
    )?;

    // Create index for foreign key to improve query performance
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_rule_category_id ON rule(category_id)",
        (),
    )?;

    // Improve performance of the priority-ordered reads
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_rule_user_priority ON rule(user_id, priority DESC)",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('rule', 0)",
        (),
    )?;

    Ok(())
}

/// Trim and validate the builder's pattern before it is persisted.
fn validate_builder(mut builder: RuleBuilder) -> Result<RuleBuilder, Error> {
    builder.pattern = builder.pattern.trim().to_owned();

    if builder.pattern.is_empty() {
        return Err(Error::EmptyRulePattern);
    }

    compile_pattern(&builder.pattern)?;

    Ok(builder)
}

fn map_foreign_key_error(error: rusqlite::Error, builder: &RuleBuilder) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidCategory(Some(builder.category_id)),
        error => error.into(),
    }
}

fn map_rule_row(row: &Row) -> Result<Rule, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let pattern = row.get(2)?;
    let category_id = row.get(3)?;
    let priority = row.get(4)?;
    let is_active = row.get(5)?;
    let raw_user_id = row.get(6)?;

    Ok(Rule {
        id,
        name,
        pattern,
        category_id,
        priority,
        is_active,
        user_id: UserID::new(raw_user_id),
    })
}
