//! Handler for logging out.

use axum::{http::StatusCode, response::Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::clear_session_cookies, envelope::render_json};

/// Handler for log-out requests.
///
/// Overwrites the session cookies with expired values so the client deletes
/// them.
pub async fn log_out_endpoint(jar: PrivateCookieJar) -> (PrivateCookieJar, Response) {
    (
        clear_session_cookies(jar),
        render_json(
            StatusCode::OK,
            serde_json::json!({}),
            "User logged out successfully.",
        ),
    )
}
