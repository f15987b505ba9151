//! Handlers for the transaction summary routes.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    AppState, Error,
    envelope::render_json,
    timezone::local_today,
    user::UserID,
};

use super::summary::{summary_for_day, summary_for_month, totals_by_category};

/// Handler for summarizing today's transactions.
///
/// "Today" is the current calendar day in the server's configured timezone.
pub async fn today_summary_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let summary = summary_for_day(
        user_id,
        today,
        state.transaction_list_limit,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        summary,
        "Today's transactions retrieved.",
    ))
}

/// Handler for summarizing the current calendar month's transactions.
pub async fn monthly_summary_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let summary = summary_for_month(
        user_id,
        today.year(),
        today.month(),
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        summary,
        "Monthly transactions retrieved.",
    ))
}

/// Handler for the per-category spending totals.
pub async fn category_totals_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let totals = totals_by_category(
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(StatusCode::OK, totals, "Spending by category."))
}
