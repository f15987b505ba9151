//! The user model and the database functions for managing accounts.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, password::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, stored lowercase.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// A URL pointing at the user's avatar image on the external media host.
    pub avatar: Option<String>,
}

impl User {
    /// The view of the user that is safe to send to clients.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// The client-facing view of a user. Never contains the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// A URL pointing at the user's avatar image.
    pub avatar: Option<String>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password TEXT NOT NULL,
                avatar TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// The email is trimmed and lowercased before storage so that look-ups are
/// case-insensitive.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if a user with the same email already
/// exists, or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    name: &str,
    email: &str,
    password_hash: PasswordHash,
    avatar: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let email = email.trim().to_lowercase();

    connection.execute(
        "INSERT INTO user (email, name, password, avatar) VALUES (?1, ?2, ?3, ?4)",
        (&email, name, password_hash.as_ref(), avatar),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        name: name.to_owned(),
        password_hash,
        avatar: avatar.map(str::to_owned),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, password, avatar FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`, ignoring case.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let email = email.trim().to_lowercase();

    connection
        .prepare("SELECT id, email, name, password, avatar FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// Overwrite the name and/or email of the user `user_id`.
///
/// Fields that are `None` keep their stored value.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, [Error::DuplicateEmail] if the new email is taken, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn update_user_details(
    user_id: UserID,
    name: Option<&str>,
    email: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let email = email.map(|email| email.trim().to_lowercase());

    let rows_affected = connection.execute(
        "UPDATE user SET name = COALESCE(?1, name), email = COALESCE(?2, email) WHERE id = ?3",
        (name, &email, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Overwrite the password hash of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn update_user_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Overwrite the avatar URL of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn update_user_avatar(
    user_id: UserID,
    avatar: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET avatar = ?1 WHERE id = ?2",
        (avatar, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Map a database row to a [User].
fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        avatar: row.get(4)?,
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        password::PasswordHash,
        user::{
            UserID, create_user, get_user_by_email, get_user_by_id, update_user_avatar,
            update_user_details, update_user_password,
        },
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn insert_test_user(conn: &Connection) -> super::User {
        create_user(
            "Alice",
            "alice@example.com",
            PasswordHash::new_unchecked("hunter2"),
            None,
            conn,
        )
        .expect("Could not create test user")
    }

    #[test]
    fn insert_user_succeeds() {
        let conn = get_db_connection();

        let inserted_user = insert_test_user(&conn);

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "alice@example.com");
        assert_eq!(inserted_user.name, "Alice");
    }

    #[test]
    fn insert_user_lowercases_email() {
        let conn = get_db_connection();

        let user = create_user(
            "Bob",
            "  Bob@Example.COM ",
            PasswordHash::new_unchecked("hunter2"),
            None,
            &conn,
        )
        .unwrap();

        assert_eq!(user.email, "bob@example.com");
        assert_eq!(
            get_user_by_email("BOB@example.com", &conn).unwrap().id,
            user.id
        );
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let conn = get_db_connection();
        insert_test_user(&conn);

        let duplicate = create_user(
            "Alice Again",
            "alice@example.com",
            PasswordHash::new_unchecked("hunter3"),
            None,
            &conn,
        );

        assert_eq!(duplicate, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let conn = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let conn = get_db_connection();
        let test_user = insert_test_user(&conn);

        let retrieved_user = get_user_by_id(test_user.id, &conn).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn update_details_keeps_missing_fields() {
        let conn = get_db_connection();
        let test_user = insert_test_user(&conn);

        let updated = update_user_details(test_user.id, Some("Alicia"), None, &conn).unwrap();

        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.email, test_user.email);
    }

    #[test]
    fn update_details_fails_with_non_existent_id() {
        let conn = get_db_connection();

        let result = update_user_details(UserID::new(42), Some("Nobody"), None, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_password_replaces_hash() {
        let conn = get_db_connection();
        let test_user = insert_test_user(&conn);
        let new_hash = PasswordHash::new_unchecked("hunter3");

        update_user_password(test_user.id, &new_hash, &conn).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &conn).unwrap();
        assert_eq!(retrieved_user.password_hash, new_hash);
    }

    #[test]
    fn update_avatar_sets_url() {
        let conn = get_db_connection();
        let test_user = insert_test_user(&conn);

        let updated =
            update_user_avatar(test_user.id, "https://cdn.example.com/a.png", &conn).unwrap();

        assert_eq!(
            updated.avatar.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn profile_never_contains_password_hash() {
        let conn = get_db_connection();
        let test_user = insert_test_user(&conn);

        let serialized = serde_json::to_value(test_user.profile()).unwrap();

        assert!(serialized.get("password").is_none());
        assert!(serialized.get("passwordHash").is_none());
        assert_eq!(serialized["email"], "alice@example.com");
    }
}
