//! Handler for creating a new account.

use axum::{Json, extract::State, http::StatusCode, response::Response};
use serde::Deserialize;

use crate::{
    AppState, Error,
    envelope::render_json,
    password::{PasswordHash, ValidatedPassword},
    user::create_user,
};

/// The request body for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// The new user's display name.
    pub name: Option<String>,
    /// The new user's email address.
    pub email: Option<String>,
    /// The new user's password, in plain text.
    pub password: Option<String>,
    /// A URL pointing at an avatar image on the external media host.
    pub avatar: Option<String>,
}

/// Handler for registering a new user.
///
/// The password is strength-checked and hashed before storage. Registration
/// does not log the user in; clients follow up with a log-in request.
pub async fn register_endpoint(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, Error> {
    let name = required_field(request.name, "name")?;
    let email = required_field(request.email, "email")?;
    let password = required_field(request.password, "password")?;

    if !email.contains('@') {
        return Err(Error::InvalidEmail(email));
    }

    let password_hash =
        PasswordHash::new(ValidatedPassword::new(&password)?, PasswordHash::DEFAULT_COST)?;

    let user = create_user(
        name.trim(),
        &email,
        password_hash,
        request.avatar.as_deref(),
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::CREATED,
        user.profile(),
        "User registered successfully.",
    ))
}

/// Unwrap a required string field, rejecting blank values.
pub(crate) fn required_field(field: Option<String>, name: &'static str) -> Result<String, Error> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::MissingField(name)),
    }
}

#[cfg(test)]
mod register_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, test_server},
    };

    #[tokio::test]
    async fn register_returns_profile_without_password() {
        let server = test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["email"], json!("alice@example.com"));
        assert_eq!(body["data"]["name"], json!("Alice"));
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let server = test_server();
        let body = json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": TEST_PASSWORD,
        });

        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);
        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::CONFLICT);
        let envelope: Value = response.json();
        assert_eq!(envelope["success"], json!(false));
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let server = test_server();

        for body in [
            json!({"email": "alice@example.com", "password": TEST_PASSWORD}),
            json!({"name": " ", "email": "alice@example.com", "password": TEST_PASSWORD}),
            json!({"name": "Alice", "password": TEST_PASSWORD}),
            json!({"name": "Alice", "email": "alice@example.com"}),
        ] {
            let response = server.post(endpoints::REGISTER).json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let server = test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": "hunter2",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
