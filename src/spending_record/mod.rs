//! Per-day spending breakdowns by category.
//!
//! A spending record accumulates amounts per category for a single user and
//! day, and every write also folds the summed amounts into the matching daily
//! record so the two stay consistent.

mod core;
mod endpoint;

pub use core::{
    SpendingEntry, SpendingRecord, create_spending_record_tables, record_spending,
};
pub use endpoint::create_spending_record_endpoint;
