//! Handlers for the daily record routes.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    envelope::render_json,
    timezone::local_today,
    user::UserID,
};

use super::core::{
    DailyDeltas, get_or_create_daily_record, list_daily_records, parse_day, upsert_daily_totals,
};

/// The request body for applying deltas to a day's totals.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDailyRecordRequest {
    /// The calendar day to update, in `YYYY-MM-DD` form.
    pub date: Option<String>,
    /// The amount to add to the day's total income.
    pub total_income: Option<f64>,
    /// The amount to add to the day's total spending.
    pub total_spending: Option<f64>,
}

/// Handler for applying income/spending deltas to a daily record.
///
/// Creates the record if it does not exist; the net income is recomputed in
/// the same statement that applies the deltas.
pub async fn update_daily_record_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<UpdateDailyRecordRequest>,
) -> Result<Response, Error> {
    let raw_date = request.date.ok_or(Error::MissingField("date"))?;
    let date = parse_day(&raw_date)?;

    for delta in [request.total_income, request.total_spending]
        .into_iter()
        .flatten()
    {
        if !delta.is_finite() {
            return Err(Error::InvalidAmount(delta));
        }
    }

    let record = upsert_daily_totals(
        user_id,
        date,
        DailyDeltas {
            income: request.total_income,
            spending: request.total_spending,
        },
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(StatusCode::OK, record, "Daily record updated."))
}

/// Handler for fetching (or lazily creating) today's daily record.
pub async fn get_today_daily_record_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let record = get_or_create_daily_record(
        user_id,
        today,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        record,
        "Daily record found or created.",
    ))
}

/// Handler for listing all of the user's daily records, newest first.
pub async fn list_daily_records_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let records = list_daily_records(
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(StatusCode::OK, records, "Daily records found."))
}
