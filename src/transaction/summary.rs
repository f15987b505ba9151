//! On-demand aggregation over the transaction ledger.
//!
//! Summaries are computed from the raw transaction rows at read time; nothing
//! here is persisted. The daily records maintained by the reconciliation
//! queries are a separate, write-time rollup.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month, util::days_in_year_month};

use crate::{Error, category::EntryKind, database_id::CategoryID, user::UserID};

use super::core::{Transaction, map_transaction_row};

/// Transactions in a time window together with their income/spending totals.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    /// The matching transactions, most recent first. May be capped while the
    /// totals still cover the whole window.
    pub transactions: Vec<Transaction>,
    /// The sum of income amounts in the window.
    pub total_income: f64,
    /// The sum of spending amounts in the window.
    pub total_spending: f64,
    /// One line item per spending transaction in the window, most recent
    /// first. Not grouped by category.
    pub spending_categories: Vec<SpendingLineItem>,
}

/// A single spending transaction reduced to its category and amount.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingLineItem {
    /// The category the amount was spent in.
    pub category_id: CategoryID,
    /// The amount of the spending transaction.
    pub amount: f64,
}

/// Spending accumulated per category across the user's whole ledger.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    /// The category the amounts were spent in.
    pub category_id: CategoryID,
    /// The total amount spent in the category.
    pub total_amount: f64,
    /// How many spending transactions make up the total.
    pub transaction_count: u32,
}

/// Fold a window of transactions into a summary, keeping at most
/// `transaction_limit` rows in the listing (`None` keeps all of them).
///
/// The totals and spending line items always cover every transaction passed
/// in, regardless of the cap.
fn summarize(
    mut transactions: Vec<Transaction>,
    transaction_limit: Option<usize>,
) -> TransactionSummary {
    let mut total_income = 0.0;
    let mut total_spending = 0.0;
    let mut spending_categories = Vec::new();

    for transaction in &transactions {
        match transaction.kind {
            EntryKind::Income => total_income += transaction.amount,
            EntryKind::Spending => {
                total_spending += transaction.amount;
                spending_categories.push(SpendingLineItem {
                    category_id: transaction.category_id,
                    amount: transaction.amount,
                });
            }
        }
    }

    if let Some(limit) = transaction_limit {
        transactions.truncate(limit);
    }

    TransactionSummary {
        transactions,
        total_income,
        total_spending,
        spending_categories,
    }
}

/// Summarize the user's transactions whose calendar day equals `date`.
///
/// The transaction listing is capped at `transaction_limit` rows; the totals
/// cover the whole day.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn summary_for_day(
    user_id: UserID,
    date: Date,
    transaction_limit: usize,
    connection: &Connection,
) -> Result<TransactionSummary, Error> {
    let transactions = transactions_in_range(user_id, date, date, connection)?;

    Ok(summarize(transactions, Some(transaction_limit)))
}

/// Summarize the user's transactions in the given calendar month, with no cap
/// on the transaction listing.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn summary_for_month(
    user_id: UserID,
    year: i32,
    month: Month,
    connection: &Connection,
) -> Result<TransactionSummary, Error> {
    let start = Date::from_calendar_date(year, month, 1)
        .map_err(|_| Error::InvalidDate(format!("{year}-{month}")))?;
    let end = Date::from_calendar_date(year, month, days_in_year_month(year, month))
        .map_err(|_| Error::InvalidDate(format!("{year}-{month}")))?;

    let transactions = transactions_in_range(user_id, start, end, connection)?;

    Ok(summarize(transactions, None))
}

/// The user's transactions with `start <= date <= end`, most recent first.
fn transactions_in_range(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, kind, amount, occurred_at, date, note
             FROM \"transaction\"
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY occurred_at DESC, id DESC",
        )?
        .query_map((user_id.as_i64(), start, end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect()
}

/// Total spending per category over all of the user's spending transactions,
/// largest total first. Ties are broken by category ID so the order is
/// deterministic.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn totals_by_category(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    connection
        .prepare(
            "SELECT category_id, SUM(amount) AS total_amount, COUNT(id)
             FROM \"transaction\"
             WHERE user_id = ?1 AND kind = 'spending'
             GROUP BY category_id
             ORDER BY total_amount DESC, category_id ASC",
        )?
        .query_map([user_id.as_i64()], |row| {
            Ok(CategorySpending {
                category_id: row.get(0)?,
                total_amount: row.get(1)?,
                transaction_count: row.get(2)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::SqlError))
        .collect()
}
