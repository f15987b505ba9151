//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
/// ID for rows in the transaction table.
pub type TransactionID = i64;
/// ID for rows in the category table.
pub type CategoryID = i64;
/// ID for rows in the daily record table.
pub type DailyRecordID = i64;
