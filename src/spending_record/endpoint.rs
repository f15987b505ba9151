//! Handler for the spending record route.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    daily_record::{DailyRecord, parse_day},
    database_id::CategoryID,
    envelope::render_json,
    user::UserID,
};

use super::core::{SpendingRecord, record_spending};

/// The request body for recording spending amounts.
#[derive(Debug, Deserialize)]
pub struct CreateSpendingRecordRequest {
    /// The calendar day the spending happened on, in `YYYY-MM-DD` form.
    pub date: Option<String>,
    /// Category ID (as a JSON object key) to amount spent.
    pub spending: Option<BTreeMap<String, f64>>,
}

/// The response body: the updated breakdown and the daily record it rolled
/// into.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSpendingRecordResponse {
    spending_record: SpendingRecord,
    updated_daily_record: DailyRecord,
}

/// Handler for folding per-category spending amounts into a day's records.
pub async fn create_spending_record_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<CreateSpendingRecordRequest>,
) -> Result<Response, Error> {
    let raw_date = request.date.ok_or(Error::MissingField("date"))?;
    let date = parse_day(&raw_date)?;
    let raw_spending = request.spending.ok_or(Error::MissingField("spending"))?;

    let mut spending = BTreeMap::new();
    for (raw_category_id, amount) in raw_spending {
        let category_id = raw_category_id
            .parse::<CategoryID>()
            .map_err(|_| Error::InvalidCategory(None))?;
        // Duplicate keys cannot occur in a JSON object, so plain insert is fine.
        spending.insert(category_id, amount);
    }

    let (spending_record, updated_daily_record) = record_spending(
        user_id,
        date,
        &spending,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        CreateSpendingRecordResponse {
            spending_record,
            updated_daily_record,
        },
        "Spending record updated successfully.",
    ))
}
