//! The daily rollup model and the reconciliation queries that keep it in sync
//! with incremental income/spending writes.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::{
    Date,
    format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{Error, database_id::DailyRecordID, user::UserID};

/// Per-user, per-day rollup of income and spending totals and their derived
/// net.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    /// The ID of the daily record.
    pub id: DailyRecordID,
    /// The user the record belongs to.
    pub user_id: UserID,
    /// The calendar day the record covers.
    pub date: Date,
    /// The sum of income recorded for the day.
    pub total_income: f64,
    /// The sum of spending recorded for the day.
    pub total_spending: f64,
    /// Always `total_income - total_spending`. Derived, never set directly.
    pub net_income: f64,
}

/// Income and spending amounts to add to a day's totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyDeltas {
    /// The amount to add to the day's total income.
    pub income: Option<f64>,
    /// The amount to add to the day's total spending.
    pub spending: Option<f64>,
}

/// Create the daily record table in the database.
///
/// The UNIQUE constraint on (user_id, date) is what guarantees at most one
/// record per user per day; concurrent creators collapse onto the same row
/// through the upsert in [upsert_daily_totals].
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_daily_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS daily_record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                total_income REAL NOT NULL DEFAULT 0,
                total_spending REAL NOT NULL DEFAULT 0,
                net_income REAL NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(user_id, date)
                )",
        (),
    )?;

    Ok(())
}

/// Add `deltas` to the totals for (`user_id`, `date`), creating the record if
/// it does not exist yet.
///
/// The net income is derived inside the same statement as the increments, so
/// a reader can never observe a persisted record where
/// `net_income != total_income - total_spending`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingDelta] if neither delta is given,
/// - or [Error::SqlError] if there is an SQL error.
pub fn upsert_daily_totals(
    user_id: UserID,
    date: Date,
    deltas: DailyDeltas,
    connection: &Connection,
) -> Result<DailyRecord, Error> {
    if deltas.income.is_none() && deltas.spending.is_none() {
        return Err(Error::MissingDelta);
    }

    let income = deltas.income.unwrap_or(0.0);
    let spending = deltas.spending.unwrap_or(0.0);

    let record = connection
        .prepare(
            "INSERT INTO daily_record (user_id, date, total_income, total_spending, net_income)
             VALUES (?1, ?2, ?3, ?4, ?3 - ?4)
             ON CONFLICT(user_id, date) DO UPDATE SET
                 total_income = total_income + excluded.total_income,
                 total_spending = total_spending + excluded.total_spending,
                 net_income = (total_income + excluded.total_income)
                     - (total_spending + excluded.total_spending)
             RETURNING id, user_id, date, total_income, total_spending, net_income",
        )?
        .query_row((user_id.as_i64(), date, income, spending), map_daily_record_row)?;

    Ok(record)
}

/// Return the record for (`user_id`, `date`), creating a zeroed one if none
/// exists.
///
/// An existing record has its net income recomputed and persisted on the way
/// out, healing any drift left behind by older writers.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_or_create_daily_record(
    user_id: UserID,
    date: Date,
    connection: &Connection,
) -> Result<DailyRecord, Error> {
    let healed = connection
        .prepare(
            "UPDATE daily_record SET net_income = total_income - total_spending
             WHERE user_id = ?1 AND date = ?2
             RETURNING id, user_id, date, total_income, total_spending, net_income",
        )?
        .query_row((user_id.as_i64(), date), map_daily_record_row);

    match healed {
        Ok(record) => Ok(record),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let record = connection
                .prepare(
                    "INSERT INTO daily_record (user_id, date) VALUES (?1, ?2)
                     RETURNING id, user_id, date, total_income, total_spending, net_income",
                )?
                .query_row((user_id.as_i64(), date), map_daily_record_row)?;

            Ok(record)
        }
        Err(error) => Err(error.into()),
    }
}

/// Retrieve all daily records for `user_id`, newest first.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user has no daily records,
/// - or [Error::SqlError] if there is an SQL error.
pub fn list_daily_records(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DailyRecord>, Error> {
    let records = connection
        .prepare(
            "SELECT id, user_id, date, total_income, total_spending, net_income
             FROM daily_record WHERE user_id = ?1 ORDER BY date DESC",
        )?
        .query_map([user_id.as_i64()], map_daily_record_row)?
        .map(|maybe_record| maybe_record.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(Error::NotFound);
    }

    Ok(records)
}

/// Date format for calendar days in request bodies.
const DAY_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a calendar day in `YYYY-MM-DD` form.
///
/// # Errors
/// Returns [Error::InvalidDate] if `raw` is not a valid calendar day.
pub fn parse_day(raw: &str) -> Result<Date, Error> {
    Date::parse(raw.trim(), DAY_FORMAT).map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// Map a database row to a [DailyRecord].
fn map_daily_record_row(row: &Row) -> Result<DailyRecord, rusqlite::Error> {
    Ok(DailyRecord {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        date: row.get(2)?,
        total_income: row.get(3)?,
        total_spending: row.get(4)?,
        net_income: row.get(5)?,
    })
}
