//! Handler for logging in and issuing session cookies.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::set_session_cookies,
    envelope::render_json,
    register::required_field,
    user::get_user_by_email,
};

/// The state needed to perform a log-in.
#[derive(Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LogInRequest {
    /// The email the user registered with.
    pub email: Option<String>,
    /// The user's password, in plain text.
    pub password: Option<String>,
}

/// Handler for log-in requests.
///
/// On success the session cookies are set and the user's profile returned.
/// An unknown email and a wrong password produce the same 401 so the response
/// does not reveal which emails are registered.
pub async fn log_in_endpoint(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Json(request): Json<LogInRequest>,
) -> Result<(PrivateCookieJar, Response), Error> {
    let email = required_field(request.email, "email")?;
    let password = required_field(request.password, "password")?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        get_user_by_email(&email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    // The database lock is released before the deliberately slow hash check.
    let is_password_valid = user
        .password_hash
        .verify(&password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let jar = set_session_cookies(jar, user.id, state.cookie_duration)?;

    Ok((
        jar,
        render_json(
            StatusCode::OK,
            user.profile(),
            "User logged in successfully.",
        ),
    ))
}

#[cfg(test)]
mod log_in_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::SESSION_COOKIE,
        endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, test_server_with_user},
    };

    #[tokio::test]
    async fn log_in_sets_session_cookie_and_returns_profile() {
        let (server, _state, user) = test_server_with_user().await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let session_cookie = response.cookie(SESSION_COOKIE);
        assert!(!session_cookie.value().is_empty());

        let body: Value = response.json();
        assert_eq!(body["data"]["id"], json!(user.id.as_i64()));
        assert_eq!(body["data"]["email"], json!(TEST_EMAIL));
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_is_unauthorized() {
        let (server, _state, _user) = test_server_with_user().await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": "not the password1"}))
            .await;

        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn log_in_with_unknown_email_matches_wrong_password_response() {
        let (server, _state, _user) = test_server_with_user().await;

        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": "not the password1"}))
            .await;
        let unknown_email = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "nobody@example.com", "password": TEST_PASSWORD}))
            .await;

        wrong_password.assert_status_unauthorized();
        unknown_email.assert_status_unauthorized();
        assert_eq!(
            wrong_password.json::<Value>()["message"],
            unknown_email.json::<Value>()["message"],
        );
    }

    #[tokio::test]
    async fn log_in_without_fields_is_a_bad_request() {
        let (server, _state, _user) = test_server_with_user().await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
