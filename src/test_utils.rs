//! Shared helpers for endpoint tests.

use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, build_router,
    category::{Category, EntryKind, create_category},
    endpoints,
    password::PasswordHash,
    user::{User, UserID, create_user},
};

/// A password strong enough to pass validation, used for every test user.
pub(crate) const TEST_PASSWORD: &str = "averylongandsecurepassword1";
/// The email of the default test user.
pub(crate) const TEST_EMAIL: &str = "test@example.com";

/// An [AppState] backed by a fresh in-memory database.
pub(crate) fn test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, "42", "Etc/UTC").expect("Could not create app state")
}

/// A [TestServer] with the full application router over a fresh database.
pub(crate) fn test_server() -> TestServer {
    TestServer::new(build_router(test_state()))
}

/// A [TestServer] plus a registered user.
///
/// The state is returned as well so tests can seed extra rows through the
/// shared connection.
pub(crate) async fn test_server_with_user() -> (TestServer, AppState, User) {
    let state = test_state();
    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");
        // Hash with the minimum cost; these credentials only live for one test.
        let password_hash =
            PasswordHash::from_raw_password(TEST_PASSWORD, 4).expect("Could not hash password");

        create_user("Test User", TEST_EMAIL, password_hash, None, &connection)
            .expect("Could not create test user")
    };

    let server = TestServer::new(build_router(state.clone()));

    (server, state, user)
}

/// Insert a category directly through the state's database connection.
pub(crate) fn insert_test_category(
    state: &AppState,
    name: &str,
    kind: EntryKind,
    user_id: Option<UserID>,
) -> Category {
    create_category(
        name,
        kind,
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    )
    .expect("Could not create test category")
}

/// Log the default test user in and return the log-in response.
///
/// Attach the session to later requests with
/// `.add_cookies(session.cookies())`.
pub(crate) async fn log_in_test_user(server: &TestServer) -> TestResponse {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}))
        .await;

    response.assert_status_ok();

    response
}
