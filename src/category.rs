//! Categories classify transactions as income or spending, and may be owned
//! by a single user or shared between everyone.

use std::{fmt::Display, str::FromStr};

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::CategoryID,
    envelope::render_json,
    user::UserID,
};

/// Whether a category (and the entries recorded against it) represents money
/// coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money coming in, e.g. a salary payment.
    Income,
    /// Money going out, e.g. groceries.
    Spending,
}

impl EntryKind {
    fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Spending => "spending",
        }
    }
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "income" => Ok(EntryKind::Income),
            "spending" => Ok(EntryKind::Spending),
            other => Err(Error::InvalidKind(other.to_owned())),
        }
    }
}

impl ToSql for EntryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(EntryKind::Income),
            "spending" => Ok(EntryKind::Spending),
            other => Err(FromSqlError::Other(
                format!("unknown entry kind \"{other}\"").into(),
            )),
        }
    }
}

/// A label that classifies a user's transactions.
///
/// A category with no owner is shared: every user may record entries against
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryID,
    /// The display name of the category.
    pub name: String,
    /// Whether entries in this category are income or spending.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// The owner, or `None` for shared categories.
    pub user_id: Option<UserID>,
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
                kind TEXT NOT NULL,
                user_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// The shared categories that ship with a fresh database.
const DEFAULT_CATEGORIES: &[(&str, EntryKind)] = &[
    ("Salary", EntryKind::Income),
    ("Gifts", EntryKind::Income),
    ("Food", EntryKind::Spending),
    ("Transport", EntryKind::Spending),
    ("Housing", EntryKind::Spending),
    ("Entertainment", EntryKind::Spending),
];

/// Insert the shared default categories, unless shared categories already exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let shared_count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM category WHERE user_id IS NULL",
        [],
        |row| row.get(0),
    )?;

    if shared_count > 0 {
        return Ok(());
    }

    for (name, kind) in DEFAULT_CATEGORIES {
        connection.execute(
            "INSERT INTO category (name, kind, user_id) VALUES (?1, ?2, NULL)",
            (name, kind),
        )?;
    }

    Ok(())
}

/// Create a new category in the database.
///
/// Pass `user_id = None` to create a shared category.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_category(
    name: &str,
    kind: EntryKind,
    user_id: Option<UserID>,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, kind, user_id) VALUES (?1, ?2, ?3)",
        (name, kind, user_id.map(|id| id.as_i64())),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: name.to_owned(),
        kind,
        user_id,
    })
}

/// Look up a category that `user_id` may record entries against: one of their
/// own or a shared one.
///
/// A category owned by a different user produces the same error as a missing
/// one, so the response does not reveal whether the category exists.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidCategory] if no usable category has the ID `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_usable_category(
    id: CategoryID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, user_id FROM category
             WHERE id = ?1 AND (user_id IS NULL OR user_id = ?2)",
        )?
        .query_row((id, user_id.as_i64()), map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidCategory(Some(id)),
            error => error.into(),
        })
}

/// Retrieve the categories that `user_id` may use: their own and the shared
/// ones.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, user_id FROM category
             WHERE user_id IS NULL OR user_id = ?1
             ORDER BY id ASC",
        )?
        .query_map([user_id.as_i64()], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [Category].
fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_user_id: Option<i64> = row.get(3)?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        user_id: raw_user_id.map(UserID::new),
    })
}

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// The display name of the new category.
    pub name: Option<String>,
    /// "income" or "spending".
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Handler for listing the categories the logged-in user may use.
pub async fn get_categories_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let categories = list_categories(
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(StatusCode::OK, categories, "Categories found."))
}

/// Handler for creating a category owned by the logged-in user.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Response, Error> {
    let name = match request.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(Error::MissingField("name")),
    };
    let kind = request
        .kind
        .ok_or(Error::MissingField("type"))?
        .parse::<EntryKind>()?;

    let category = create_category(
        name.trim(),
        kind,
        Some(user_id),
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::CREATED,
        category,
        "Category created.",
    ))
}
