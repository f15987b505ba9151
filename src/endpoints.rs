//! The API endpoint URIs.

/// The route for creating a transaction (POST) and listing recent ones (GET).
pub const TRANSACTIONS: &str = "/transactions";
/// The route for today's transaction summary.
pub const TRANSACTIONS_TODAY: &str = "/transactions/today";
/// The route for the current month's transaction summary.
pub const TRANSACTIONS_MONTHLY: &str = "/transactions/monthly";
/// The route for the per-category spending totals.
pub const TRANSACTIONS_CATEGORIES: &str = "/transactions/categories";
/// The route for recording per-category spending amounts.
pub const SPENDING_RECORDS: &str = "/spending-records";
/// The route for applying deltas to a day's totals.
pub const DAILY_RECORDS_UPDATE: &str = "/daily-records/update";
/// The route for listing all of a user's daily records.
pub const DAILY_RECORDS: &str = "/daily-records";
/// The route for fetching (or lazily creating) today's daily record.
pub const DAILY_RECORDS_TODAY: &str = "/daily-records/today";
/// The route for listing usable categories (GET) and creating one (POST).
pub const CATEGORIES: &str = "/categories";

/// The route for registering a new user.
pub const REGISTER: &str = "/users/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/users/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/users/logout";
/// The route for reading (GET) and updating (PATCH) the current user.
pub const ME: &str = "/users/me";
/// The route for changing the current user's password.
pub const CHANGE_PASSWORD: &str = "/users/password";
/// The route for updating the current user's avatar URL.
pub const AVATAR: &str = "/users/avatar";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_TODAY);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_MONTHLY);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::SPENDING_RECORDS);
        assert_endpoint_is_valid_uri(endpoints::DAILY_RECORDS_UPDATE);
        assert_endpoint_is_valid_uri(endpoints::DAILY_RECORDS);
        assert_endpoint_is_valid_uri(endpoints::DAILY_RECORDS_TODAY);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::ME);
        assert_endpoint_is_valid_uri(endpoints::CHANGE_PASSWORD);
        assert_endpoint_is_valid_uri(endpoints::AVATAR);
    }
}
