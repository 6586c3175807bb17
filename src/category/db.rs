use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::domain::{Category, CategoryId, CategoryName, CategoryRole},
    user::UserID,
};

/// Create a category in the database.
///
/// Pass a `role` to mark the category as special to the engine, e.g.
/// [CategoryRole::UncategorisedFallback] for the bucket that unclassified
/// bulk imports land in.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidUser] if `user_id` does not refer to a valid user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    name: CategoryName,
    role: Option<CategoryRole>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (name, role, user_id) VALUES (?1, ?2, ?3)",
            (
                name.as_ref(),
                role.map(|role| role.as_str()),
                user_id.as_i64(),
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidUser,
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        role,
        user_id,
    })
}

/// Retrieve a category owned by `user_id` by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a category owned by the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, role, user_id FROM category WHERE id = ?1 AND user_id = ?2")?
        .query_row((id, user_id.as_i64()), map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories owned by `user_id`, sorted by name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, role, user_id FROM category WHERE user_id = ?1 ORDER BY name ASC")?
        .query_map((user_id.as_i64(),), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a category owned by `user_id` by its display name.
///
/// Name comparison is case-insensitive.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user has no category with that name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_category_by_name(
    name: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, role, user_id FROM category
             WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE",
        )?
        .query_row((user_id.as_i64(), name), map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve the category that acts as the fallback bucket for unclassified
/// bulk imports, i.e. the one with the [CategoryRole::UncategorisedFallback]
/// role.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user has no fallback category,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_fallback_category(user_id: UserID, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, role, user_id FROM category WHERE user_id = ?1 AND role = ?2")?
        .query_row(
            (
                user_id.as_i64(),
                CategoryRole::UncategorisedFallback.as_str(),
            ),
            map_category_row,
        )
        .map_err(|error| error.into())
}

/// Check that `category_id` refers to a category owned by `user_id`.
///
/// The foreign keys on rules and transactions only check that the category
/// exists, which would let a row reference another user's category. A missing
/// and a foreign category get the same error so the caller learns nothing
/// about other users' data.
pub(crate) fn check_category_ownership(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match get_category(category_id, user_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidCategory(Some(category_id))),
        Err(error) => Err(error),
    }
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                role TEXT,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(user_id, name)
            );",
        (),
    )?;

    // Create index for foreign key to improve query performance
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id)",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('category', 0)",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_role: Option<String> = row.get(2)?;
    let raw_user_id = row.get(3)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        role: CategoryRole::from_column(raw_role),
        user_id: UserID::new(raw_user_id),
    })
}

#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        category::{
            db::{
                create_category, get_categories, get_category, get_category_by_name,
                get_fallback_category,
            },
            domain::{CategoryName, CategoryRole},
        },
        db::initialize,
        user::{User, UserID, create_user},
    };

    fn get_test_db_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialise database");
        let user = create_user("test", &connection).expect("Could not create test user");

        (connection, user)
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, user) = get_test_db_connection();
        let name = CategoryName::new("Groceries").unwrap();

        let category = create_category(name.clone(), None, user.id, &connection)
            .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, name);
        assert_eq!(category.role, None);
        assert_eq!(category.user_id, user.id);
    }

    #[test]
    fn create_category_fails_with_invalid_user_id() {
        let (connection, user) = get_test_db_connection();
        let name = CategoryName::new_unchecked("Groceries");

        let result = create_category(name, None, UserID::new(user.id.as_i64() + 1), &connection);

        assert_eq!(result, Err(Error::InvalidUser));
    }

    #[test]
    fn empty_category_name_is_rejected() {
        assert_eq!(CategoryName::new("   "), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn get_category_is_scoped_to_the_owner() {
        let (connection, owner) = get_test_db_connection();
        let other_user = create_user("other", &connection).unwrap();
        let category = create_category(
            CategoryName::new_unchecked("Transport"),
            None,
            owner.id,
            &connection,
        )
        .unwrap();

        let got = get_category(category.id, owner.id, &connection);
        let got_by_other = get_category(category.id, other_user.id, &connection);

        assert_eq!(got, Ok(category));
        assert_eq!(got_by_other, Err(Error::NotFound));
    }

    #[test]
    fn get_category_by_name_is_case_insensitive() {
        let (connection, user) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            None,
            user.id,
            &connection,
        )
        .unwrap();

        let got = get_category_by_name("gRoCeRiEs", user.id, &connection);

        assert_eq!(got, Ok(category));
    }

    #[test]
    fn get_fallback_category_uses_role_not_name() {
        let (connection, user) = get_test_db_connection();
        create_category(
            CategoryName::new_unchecked("Other"),
            None,
            user.id,
            &connection,
        )
        .unwrap();
        let fallback = create_category(
            CategoryName::new_unchecked("Everything Else"),
            Some(CategoryRole::UncategorisedFallback),
            user.id,
            &connection,
        )
        .unwrap();

        let got = get_fallback_category(user.id, &connection);

        assert_eq!(got, Ok(fallback));
    }

    #[test]
    fn get_fallback_category_fails_when_no_role_is_set() {
        let (connection, user) = get_test_db_connection();
        create_category(
            CategoryName::new_unchecked("Other"),
            None,
            user.id,
            &connection,
        )
        .unwrap();

        let got = get_fallback_category(user.id, &connection);

        assert_eq!(got, Err(Error::NotFound));
    }

    #[test]
    fn get_categories_only_returns_the_owners_rows() {
        let (connection, owner) = get_test_db_connection();
        let other_user = create_user("other", &connection).unwrap();
        let owned = create_category(
            CategoryName::new_unchecked("Dining"),
            None,
            owner.id,
            &connection,
        )
        .unwrap();
        create_category(
            CategoryName::new_unchecked("Dining"),
            None,
            other_user.id,
            &connection,
        )
        .unwrap();

        let categories = get_categories(owner.id, &connection).unwrap();

        assert_eq!(categories, vec![owned]);
    }
}
