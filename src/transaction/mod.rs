//! Transaction management for the spending tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validated `NewTransaction` input
//! - The ledger write path, which also folds amounts into the daily records
//! - On-demand summaries for a day, a month, and per category
//! - Handlers for the transaction routes

mod core;
mod create_endpoint;
mod list_endpoint;
mod summary;
mod summary_endpoints;

pub use core::{
    DEFAULT_TRANSACTION_LIST_LIMIT, NewTransaction, Transaction, create_transaction,
    create_transaction_table, list_transactions, parse_occurred_at,
};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use summary::{
    CategorySpending, SpendingLineItem, TransactionSummary, summary_for_day, summary_for_month,
    totals_by_category,
};
pub use summary_endpoints::{
    category_totals_endpoint, monthly_summary_endpoint, today_summary_endpoint,
};
