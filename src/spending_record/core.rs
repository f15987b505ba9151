//! The spending record model and the write path that keeps it and the daily
//! rollup consistent.

use std::collections::BTreeMap;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    category::{EntryKind, get_usable_category},
    daily_record::{DailyDeltas, DailyRecord, get_or_create_daily_record, upsert_daily_totals},
    database_id::{CategoryID, DailyRecordID, DatabaseID},
    user::UserID,
};

/// One category's accumulated spending within a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingEntry {
    /// The category the amount was spent in.
    pub category_id: CategoryID,
    /// The category's display name, resolved when the record is read.
    pub category_name: String,
    /// The accumulated amount spent in the category on this day.
    pub amount: f64,
}

/// Per-user, per-day breakdown of spending by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingRecord {
    /// The ID of the spending record.
    pub id: DatabaseID,
    /// The user the record belongs to.
    pub user_id: UserID,
    /// The daily record covering the same (user, day).
    pub daily_record_id: DailyRecordID,
    /// The calendar day the record covers.
    pub date: Date,
    /// The per-category amounts, in category ID order.
    pub spending: Vec<SpendingEntry>,
}

/// Create the spending record tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_spending_record_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS spending_record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                daily_record_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(daily_record_id) REFERENCES daily_record(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(user_id, date)
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS spending_record_entry (
                spending_record_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                amount REAL NOT NULL DEFAULT 0,
                FOREIGN KEY(spending_record_id) REFERENCES spending_record(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(spending_record_id, category_id)
                )",
        (),
    )?;

    Ok(())
}

/// Fold `spending` (category ID to amount) into the user's record for `date`.
///
/// Creates the daily record and spending record on first write, increments
/// the per-category amounts, and adds the summed amounts to the day's total
/// spending, recomputing its net income. Everything runs in one SQL
/// transaction; a rejected entry leaves no partial writes behind.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptySpending] if `spending` has no entries,
/// - [Error::InvalidAmount] if an amount is not a positive, finite number,
/// - [Error::InvalidCategory] if a category is not shared or owned by the user,
/// - [Error::CategoryKindMismatch] if a category is not a spending category,
/// - or [Error::SqlError] if there is an SQL error.
pub fn record_spending(
    user_id: UserID,
    date: Date,
    spending: &BTreeMap<CategoryID, f64>,
    connection: &Connection,
) -> Result<(SpendingRecord, DailyRecord), Error> {
    if spending.is_empty() {
        return Err(Error::EmptySpending);
    }

    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Deferred)?;

    for (&category_id, &amount) in spending {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        let category = get_usable_category(category_id, user_id, &sql_transaction)?;
        if category.kind != EntryKind::Spending {
            return Err(Error::CategoryKindMismatch {
                category: category.kind,
                requested: EntryKind::Spending,
            });
        }
    }

    let daily_record = get_or_create_daily_record(user_id, date, &sql_transaction)?;

    // The no-op DO UPDATE makes the upsert return the existing row's ID;
    // DO NOTHING would return no row at all.
    let record_id: DatabaseID = sql_transaction
        .prepare(
            "INSERT INTO spending_record (user_id, date, daily_record_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, date) DO UPDATE SET daily_record_id = daily_record_id
             RETURNING id",
        )?
        .query_row((user_id.as_i64(), date, daily_record.id), |row| row.get(0))?;

    for (&category_id, &amount) in spending {
        sql_transaction.execute(
            "INSERT INTO spending_record_entry (spending_record_id, category_id, amount)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(spending_record_id, category_id)
                 DO UPDATE SET amount = amount + excluded.amount",
            (record_id, category_id, amount),
        )?;
    }

    let total_spending: f64 = spending.values().sum();
    let updated_daily_record = upsert_daily_totals(
        user_id,
        date,
        DailyDeltas {
            income: None,
            spending: Some(total_spending),
        },
        &sql_transaction,
    )?;

    let spending_record = get_spending_record(record_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok((spending_record, updated_daily_record))
}

/// Read a spending record and its entries, with category names resolved.
fn get_spending_record(id: DatabaseID, connection: &Connection) -> Result<SpendingRecord, Error> {
    let (user_id, daily_record_id, date) = connection
        .prepare("SELECT user_id, daily_record_id, date FROM spending_record WHERE id = ?1")?
        .query_row([id], |row| {
            Ok((UserID::new(row.get(0)?), row.get(1)?, row.get(2)?))
        })?;

    let spending = connection
        .prepare(
            "SELECT entry.category_id, category.name, entry.amount
             FROM spending_record_entry entry
             INNER JOIN category ON category.id = entry.category_id
             WHERE entry.spending_record_id = ?1
             ORDER BY entry.category_id ASC",
        )?
        .query_map([id], |row| {
            Ok(SpendingEntry {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                amount: row.get(2)?,
            })
        })?
        .map(|maybe_entry| maybe_entry.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SpendingRecord {
        id,
        user_id,
        daily_record_id,
        date,
        spending,
    })
}
