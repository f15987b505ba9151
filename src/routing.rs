//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::auth_guard,
    category::{create_category_endpoint, get_categories_endpoint},
    daily_record::{
        get_today_daily_record_endpoint, list_daily_records_endpoint, update_daily_record_endpoint,
    },
    endpoints,
    envelope::render_failure,
    log_in::log_in_endpoint,
    log_out::log_out_endpoint,
    logging::logging_middleware,
    profile::{
        change_password_endpoint, get_current_user_endpoint, update_account_endpoint,
        update_avatar_endpoint,
    },
    register::register_endpoint,
    spending_record::create_spending_record_endpoint,
    transaction::{
        category_totals_endpoint, create_transaction_endpoint, list_transactions_endpoint,
        monthly_summary_endpoint, today_summary_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(log_out_endpoint))
        .route(
            endpoints::ME,
            get(get_current_user_endpoint).patch(update_account_endpoint),
        )
        .route(endpoints::CHANGE_PASSWORD, post(change_password_endpoint))
        .route(endpoints::AVATAR, post(update_avatar_endpoint))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(list_transactions_endpoint),
        )
        .route(endpoints::TRANSACTIONS_TODAY, get(today_summary_endpoint))
        .route(
            endpoints::TRANSACTIONS_MONTHLY,
            get(monthly_summary_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_CATEGORIES,
            get(category_totals_endpoint),
        )
        .route(
            endpoints::SPENDING_RECORDS,
            post(create_spending_record_endpoint),
        )
        .route(endpoints::DAILY_RECORDS, get(list_daily_records_endpoint))
        .route(
            endpoints::DAILY_RECORDS_TODAY,
            get(get_today_daily_record_endpoint),
        )
        .route(
            endpoints::DAILY_RECORDS_UPDATE,
            post(update_daily_record_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .fallback(get_not_found)
        .with_state(state)
}

/// Fallback for requests that match no route.
async fn get_not_found() -> Response {
    render_failure(
        StatusCode::NOT_FOUND,
        "The requested resource could not be found.",
    )
}
