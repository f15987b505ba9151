//! Database schema setup.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, category, daily_record, spending_record, transaction, user};

/// Create the application tables and seed data if they do not exist.
///
/// The tables are created inside an exclusive transaction so concurrent
/// startups cannot observe a half-built schema.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    user::create_user_table(&sql_transaction)?;
    category::create_category_table(&sql_transaction)?;
    transaction::create_transaction_table(&sql_transaction)?;
    daily_record::create_daily_record_table(&sql_transaction)?;
    spending_record::create_spending_record_tables(&sql_transaction)?;
    category::seed_default_categories(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}
