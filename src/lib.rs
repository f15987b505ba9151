//! Pocketbook is a backend service for tracking personal income and spending.
//!
//! This library provides a JSON REST API for managing user accounts,
//! categorized transactions, and the per-day income/spending rollups that are
//! derived from them.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
pub mod category;
mod daily_record;
mod database_id;
mod db;
mod endpoints;
mod envelope;
mod log_in;
mod log_out;
mod logging;
mod password;
mod profile;
mod register;
mod routing;
mod spending_record;
mod timezone;
mod transaction;
pub mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;

use crate::{
    category::EntryKind,
    database_id::CategoryID,
    envelope::render_failure,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email or password did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Either the session or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no session cookies in the request")]
    CookieMissing,

    /// There was an error parsing or formatting the session expiry date-time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not handle session expiry date-time \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A required field was missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// An email address did not look like an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A date string could not be parsed.
    #[error("invalid date \"{0}\", use an ISO 8601 date or date-time")]
    InvalidDate(String),

    /// An entry type was neither "income" nor "spending".
    #[error("\"{0}\" is not a valid entry type, expected \"income\" or \"spending\"")]
    InvalidKind(String),

    /// An amount was not a positive, finite number.
    #[error("{0} is not a valid amount, amounts must be positive numbers")]
    InvalidAmount(f64),

    /// The category ID used in a write did not match a category the user may
    /// record entries against.
    #[error("the category ID does not refer to a usable category")]
    InvalidCategory(Option<CategoryID>),

    /// The entry kind does not match the kind of the referenced category.
    #[error("cannot record a {requested} entry against a {category} category")]
    CategoryKindMismatch {
        /// The kind of the referenced category.
        category: EntryKind,
        /// The kind the caller asked to record.
        requested: EntryKind,
    },

    /// A spending record was submitted without any category amounts.
    #[error("at least one category amount is required")]
    EmptySpending,

    /// A daily record update was submitted without any delta to apply.
    #[error("at least one of totalIncome and totalSpending is required")]
    MissingDelta,

    /// The email address is already registered.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Error::InvalidCredentials | Error::CookieMissing => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::MissingField(_)
            | Error::InvalidEmail(_)
            | Error::InvalidDate(_)
            | Error::InvalidKind(_)
            | Error::InvalidAmount(_)
            | Error::InvalidCategory(_)
            | Error::CategoryKindMismatch { .. }
            | Error::EmptySpending
            | Error::MissingDelta => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            Error::InvalidDateFormat(_, _)
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);

                return render_failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong, check the server logs for more details.",
                );
            }
        };

        render_failure(status_code, &self.to_string())
    }
}
