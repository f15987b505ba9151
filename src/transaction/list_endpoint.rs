//! Handler for listing recent transactions.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{AppState, Error, envelope::render_json, user::UserID};

use super::core::list_transactions;

/// Handler for listing the user's most recent transactions.
///
/// The listing is capped at the app's configured transaction list limit.
pub async fn list_transactions_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let transactions = list_transactions(
        user_id,
        state.transaction_list_limit,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        transactions,
        "Transactions found.",
    ))
}

#[cfg(test)]
mod list_transactions_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        category::EntryKind,
        endpoints,
        test_utils::{insert_test_category, log_in_test_user, test_server_with_user},
    };

    #[tokio::test]
    async fn listing_is_capped_and_most_recent_first() {
        let (server, state, user) = test_server_with_user().await;
        let food = insert_test_category(&state, "Food", EntryKind::Spending, Some(user.id));
        let session = log_in_test_user(&server).await;

        for day in 1..=12 {
            let response = server
                .post(endpoints::TRANSACTIONS)
                .add_cookies(session.cookies())
                .json(&json!({
                    "categoryId": food.id,
                    "type": "spending",
                    "amount": day as f64,
                    "date": format!("2025-06-{day:02}T12:00:00Z"),
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_cookies(session.cookies())
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let transactions = body["data"].as_array().expect("data should be an array");
        assert_eq!(transactions.len(), 10);
        assert_eq!(transactions[0]["amount"], json!(12.0));
        assert_eq!(transactions[9]["amount"], json!(3.0));
    }

    #[tokio::test]
    async fn listing_requires_a_session() {
        let (server, _state, _user) = test_server_with_user().await;

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
