//! The transaction model, input validation, and the ledger write path.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::{
    Error,
    category::{EntryKind, get_usable_category},
    daily_record::{DailyDeltas, DailyRecord, parse_day, upsert_daily_totals},
    database_id::{CategoryID, TransactionID},
    user::UserID,
};

/// The number of transactions returned by the plain listing endpoint and the
/// daily summary.
pub const DEFAULT_TRANSACTION_LIST_LIMIT: usize = 10;

/// An income or spending event recorded by a user.
///
/// Transactions are immutable once created; corrections are made by recording
/// a compensating transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionID,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The category the transaction belongs to.
    pub category_id: CategoryID,
    /// Whether the transaction is income or spending.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// The amount of money that changed hands. Always positive; the direction
    /// comes from `kind`.
    pub amount: f64,
    /// The instant the transaction happened, normalized to UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    /// The calendar day of `occurred_at`, used for day-granularity grouping.
    pub date: Date,
    /// A free-form note about the transaction.
    pub note: String,
}

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    user_id: UserID,
    category_id: CategoryID,
    kind: EntryKind,
    amount: f64,
    occurred_at: OffsetDateTime,
    note: String,
}

impl NewTransaction {
    /// Validate the parts of a transaction before it is recorded.
    ///
    /// `occurred_at` is normalized to UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is not a positive, finite
    /// number.
    pub fn new(
        user_id: UserID,
        category_id: CategoryID,
        kind: EntryKind,
        amount: f64,
        occurred_at: OffsetDateTime,
        note: &str,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        Ok(Self {
            user_id,
            category_id,
            kind,
            amount,
            occurred_at: occurred_at.to_offset(UtcOffset::UTC),
            note: note.to_owned(),
        })
    }
}

/// Date-time format for ISO strings without an offset, e.g. "2025-06-01T13:30:00".
const NAIVE_DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Parse the `date` field of a transaction request.
///
/// Some clients produce ISO strings with unpadded month or day fields such as
/// `2025-1-5T13:30:00Z`; when a time component is present those fields are
/// padded to two digits before parsing. Accepted forms after normalization:
/// RFC 3339, a naive date-time (assumed UTC), and a bare calendar day
/// (midnight UTC).
///
/// # Errors
/// Returns [Error::InvalidDate] if the normalized string does not parse.
pub fn parse_occurred_at(raw: &str) -> Result<OffsetDateTime, Error> {
    let normalized = pad_date_components(raw.trim());

    if let Ok(date_time) = OffsetDateTime::parse(&normalized, &Rfc3339) {
        return Ok(date_time.to_offset(UtcOffset::UTC));
    }

    if let Ok(date_time) = PrimitiveDateTime::parse(&normalized, NAIVE_DATE_TIME_FORMAT) {
        return Ok(date_time.assume_utc());
    }

    if let Ok(date) = parse_day(&normalized) {
        return Ok(date.midnight().assume_utc());
    }

    Err(Error::InvalidDate(raw.to_owned()))
}

/// Pad the month and day of a date-time string to two digits, e.g.
/// "2025-1-5T..." becomes "2025-01-05T...". Strings without a time component
/// are returned unchanged.
fn pad_date_components(raw: &str) -> String {
    let Some((date_part, time_part)) = raw.split_once('T') else {
        return raw.to_owned();
    };

    let pieces: Vec<&str> = date_part.split('-').collect();
    match pieces.as_slice() {
        [year, month, day] => format!("{year}-{month:0>2}-{day:0>2}T{time_part}"),
        _ => raw.to_owned(),
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
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                occurred_at TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Day and month summaries filter on (user, date).
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Record a transaction and fold its amount into the matching daily record.
///
/// Both writes happen in one SQL transaction so a failure cannot leave the
/// ledger and the daily rollup out of step.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category is not shared or owned by the
///   user,
/// - [Error::CategoryKindMismatch] if the category's kind differs from the
///   transaction's,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<(Transaction, DailyRecord), Error> {
    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Deferred)?;

    let category = get_usable_category(
        new_transaction.category_id,
        new_transaction.user_id,
        &sql_transaction,
    )?;
    if category.kind != new_transaction.kind {
        return Err(Error::CategoryKindMismatch {
            category: category.kind,
            requested: new_transaction.kind,
        });
    }

    let date = new_transaction.occurred_at.date();
    let transaction = sql_transaction
        .prepare(
            "INSERT INTO \"transaction\" (user_id, category_id, kind, amount, occurred_at, date, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, category_id, kind, amount, occurred_at, date, note",
        )?
        .query_row(
            (
                new_transaction.user_id.as_i64(),
                new_transaction.category_id,
                new_transaction.kind,
                new_transaction.amount,
                new_transaction.occurred_at,
                date,
                &new_transaction.note,
            ),
            map_transaction_row,
        )?;

    let deltas = match new_transaction.kind {
        EntryKind::Income => DailyDeltas {
            income: Some(new_transaction.amount),
            spending: None,
        },
        EntryKind::Spending => DailyDeltas {
            income: None,
            spending: Some(new_transaction.amount),
        },
    };
    let daily_record =
        upsert_daily_totals(new_transaction.user_id, date, deltas, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok((transaction, daily_record))
}

/// Retrieve up to `limit` of the user's transactions, most recent first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, kind, amount, occurred_at, date, note
             FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY occurred_at DESC, id DESC
             LIMIT ?2",
        )?
        .query_map((user_id.as_i64(), limit as i64), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [Transaction].
pub(super) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        kind: row.get(3)?,
        amount: row.get(4)?,
        occurred_at: row.get(5)?,
        date: row.get(6)?,
        note: row.get(7)?,
    })
}

#[cfg(test)]
mod parse_occurred_at_tests {
    use time::macros::datetime;

    use crate::Error;

    use super::parse_occurred_at;

    #[test]
    fn parses_rfc_3339() {
        let got = parse_occurred_at("2025-06-01T13:30:00Z").unwrap();

        assert_eq!(got, datetime!(2025-06-01 13:30:00 UTC));
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        let got = parse_occurred_at("2025-06-01T13:30:00+02:00").unwrap();

        assert_eq!(got, datetime!(2025-06-01 11:30:00 UTC));
        assert!(got.offset().is_utc());
    }

    #[test]
    fn pads_unpadded_month_and_day() {
        let got = parse_occurred_at("2025-1-5T13:30:00Z").unwrap();

        assert_eq!(got, datetime!(2025-01-05 13:30:00 UTC));
    }

    #[test]
    fn assumes_utc_for_naive_date_times() {
        let got = parse_occurred_at("2025-06-01T13:30:00").unwrap();

        assert_eq!(got, datetime!(2025-06-01 13:30:00 UTC));
    }

    #[test]
    fn accepts_bare_dates_at_midnight() {
        let got = parse_occurred_at("2025-06-01").unwrap();

        assert_eq!(got, datetime!(2025-06-01 00:00:00 UTC));
    }

    #[test]
    fn rejects_garbage() {
        let result = parse_occurred_at("first of June");

        assert_eq!(result, Err(Error::InvalidDate("first of June".to_owned())));
    }

    #[test]
    fn rejects_impossible_dates() {
        let result = parse_occurred_at("2025-13-40T00:00:00Z");

        assert!(matches!(result, Err(Error::InvalidDate(_))));
    }
}
