//! Handlers for reading and updating the logged-in user's account.

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
    password::{PasswordHash, ValidatedPassword},
    register::required_field,
    user::{
        UserID, get_user_by_id, update_user_avatar, update_user_details, update_user_password,
    },
};

/// The request body for updating account details.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// A new display name, if it should change.
    pub name: Option<String>,
    /// A new email address, if it should change.
    pub email: Option<String>,
}

/// The request body for changing the password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// The user's current password, for re-authentication.
    pub current_password: Option<String>,
    /// The password to change to.
    pub new_password: Option<String>,
}

/// The request body for updating the avatar.
#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    /// A URL pointing at the new avatar image on the external media host.
    pub avatar: Option<String>,
}

/// Handler for fetching the logged-in user's profile.
pub async fn get_current_user_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let user = get_user_by_id(
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        user.profile(),
        "User fetched successfully.",
    ))
}

/// Handler for updating the logged-in user's name and/or email.
pub async fn update_account_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Response, Error> {
    if request.name.is_none() && request.email.is_none() {
        return Err(Error::MissingField("name or email"));
    }

    if let Some(email) = &request.email
        && !email.contains('@')
    {
        return Err(Error::InvalidEmail(email.clone()));
    }

    let user = update_user_details(
        user_id,
        request.name.as_deref(),
        request.email.as_deref(),
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        user.profile(),
        "Account details updated successfully.",
    ))
}

/// Handler for changing the logged-in user's password.
///
/// The current password must be provided again; a stolen session cookie alone
/// must not be enough to lock the owner out.
pub async fn change_password_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Response, Error> {
    let current_password = required_field(request.current_password, "currentPassword")?;
    let new_password = required_field(request.new_password, "newPassword")?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        get_user_by_id(user_id, &connection)?
    };

    let is_password_valid = user
        .password_hash
        .verify(&current_password)
        .map_err(|error| Error::HashingError(error.to_string()))?;
    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let password_hash = PasswordHash::new(
        ValidatedPassword::new(&new_password)?,
        PasswordHash::DEFAULT_COST,
    )?;

    update_user_password(
        user_id,
        &password_hash,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        serde_json::json!({}),
        "Password changed successfully.",
    ))
}

/// Handler for updating the logged-in user's avatar URL.
///
/// The image itself lives on the external media host; this endpoint only
/// stores the URL the host handed back to the client.
pub async fn update_avatar_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<UpdateAvatarRequest>,
) -> Result<Response, Error> {
    let avatar = required_field(request.avatar, "avatar")?;

    let user = update_user_avatar(
        user_id,
        avatar.trim(),
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )?;

    Ok(render_json(
        StatusCode::OK,
        user.profile(),
        "Avatar updated successfully.",
    ))
}

#[cfg(test)]
mod profile_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, log_in_test_user, test_server_with_user},
    };

    #[tokio::test]
    async fn me_returns_the_logged_in_users_profile() {
        let (server, _state, user) = test_server_with_user().await;
        let session = log_in_test_user(&server).await;

        let response = server.get(endpoints::ME).add_cookies(session.cookies()).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["id"], json!(user.id.as_i64()));
        assert_eq!(body["data"]["email"], json!(TEST_EMAIL));
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn updating_name_keeps_email() {
        let (server, _state, _user) = test_server_with_user().await;
        let session = log_in_test_user(&server).await;

        let response = server
            .patch(endpoints::ME)
            .add_cookies(session.cookies())
            .json(&json!({"name": "New Name"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["name"], json!("New Name"));
        assert_eq!(body["data"]["email"], json!(TEST_EMAIL));
    }

    #[tokio::test]
    async fn updating_nothing_is_a_bad_request() {
        let (server, _state, _user) = test_server_with_user().await;
        let session = log_in_test_user(&server).await;

        let response = server
            .patch(endpoints::ME)
            .add_cookies(session.cookies())
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn password_change_requires_the_current_password() {
        let (server, _state, _user) = test_server_with_user().await;
        let session = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::CHANGE_PASSWORD)
            .add_cookies(session.cookies())
            .json(&json!({
                "currentPassword": "not the password1",
                "newPassword": "anotherverysecurepassword2",
            }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn password_change_allows_log_in_with_the_new_password() {
        let (server, _state, _user) = test_server_with_user().await;
        let session = log_in_test_user(&server).await;
        let new_password = "anotherverysecurepassword2";

        let response = server
            .post(endpoints::CHANGE_PASSWORD)
            .add_cookies(session.cookies())
            .json(&json!({
                "currentPassword": TEST_PASSWORD,
                "newPassword": new_password,
            }))
            .await;
        response.assert_status_ok();

        let old_log_in = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}))
            .await;
        old_log_in.assert_status_unauthorized();

        let new_log_in = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": new_password}))
            .await;
        new_log_in.assert_status_ok();
    }

    #[tokio::test]
    async fn avatar_update_returns_the_new_url() {
        let (server, _state, _user) = test_server_with_user().await;
        let session = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::AVATAR)
            .add_cookies(session.cookies())
            .json(&json!({"avatar": "https://cdn.example.com/a.png"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body["data"]["avatar"],
            json!("https://cdn.example.com/a.png")
        );
    }
}
