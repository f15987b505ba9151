//! Handler for recording a new transaction.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::EntryKind,
    database_id::CategoryID,
    envelope::render_json,
    user::UserID,
};

use super::core::{NewTransaction, create_transaction, parse_occurred_at};

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// The category to record the transaction against.
    pub category_id: Option<CategoryID>,
    /// "income" or "spending".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The amount of money that changed hands.
    pub amount: Option<f64>,
    /// When the transaction happened, as an ISO-like date or date-time string.
    pub date: Option<String>,
    /// A free-form note about the transaction.
    pub note: Option<String>,
}

/// Handler for recording a transaction.
///
/// Validates the fields, resolves the category, and stores the transaction,
/// folding its amount into the matching daily record in the same write.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<Response, Error> {
    let category_id = request.category_id.ok_or(Error::MissingField("categoryId"))?;
    let raw_kind = request.kind.ok_or(Error::MissingField("type"))?;
    let amount = request.amount.ok_or(Error::MissingField("amount"))?;
    let raw_date = request.date.ok_or(Error::MissingField("date"))?;

    let kind = raw_kind.parse::<EntryKind>()?;
    let occurred_at = parse_occurred_at(&raw_date)?;
    let new_transaction = NewTransaction::new(
        user_id,
        category_id,
        kind,
        amount,
        occurred_at,
        request.note.as_deref().unwrap_or_default(),
    )?;

    let (transaction, _daily_record) = create_transaction(
        new_transaction,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::CREATED,
        transaction,
        "Transaction created successfully.",
    ))
}
