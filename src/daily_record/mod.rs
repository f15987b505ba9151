//! Daily income/spending rollups.
//!
//! This module contains everything related to daily records:
//! - The `DailyRecord` model and the upsert that keeps its totals and derived
//!   net income consistent
//! - Database functions for fetching and listing records
//! - Handlers for the daily record routes

mod core;
mod endpoints;

pub use core::{
    DailyDeltas, DailyRecord, create_daily_record_table, get_or_create_daily_record,
    list_daily_records, parse_day, upsert_daily_totals,
};
pub use endpoints::{
    get_today_daily_record_endpoint, list_daily_records_endpoint, update_daily_record_endpoint,
};
