//! Functions for the session cookies that keep users logged in.

use std::{cmp::max, num::ParseIntError};

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{Error, user::UserID};

/// The name of the cookie holding the logged-in user's ID.
pub const SESSION_COOKIE: &str = "session_user";
/// The name of the cookie holding the session expiry.
pub(crate) const SESSION_EXPIRY_COOKIE: &str = "session_expiry";
/// How long a session lasts without activity.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Date time format for the expiry cookie value, e.g. "2021-01-01 00:00:00 +00:00".
///
/// Use format instead of to_string when producing values so single digit
/// hours around midnight do not break round-tripping.
const EXPIRY_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
);

/// Add the session cookies for `user_id` to the jar, expiring `duration` from
/// now.
///
/// Returns the cookie jar with the cookies added.
///
/// # Errors
///
/// Returns an [Error::InvalidDateFormat] if the expiry time cannot be formatted.
pub fn set_session_cookies(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry = OffsetDateTime::now_utc() + duration;
    let expiry_string = format_expiry(expiry)?;

    Ok(jar
        .add(build_session_cookie(
            SESSION_COOKIE,
            user_id.as_i64().to_string(),
            expiry,
        ))
        .add(build_session_cookie(
            SESSION_EXPIRY_COOKIE,
            expiry_string,
            expiry,
        )))
}

/// Overwrite the session cookies with expired values, which should delete them
/// on the client side.
pub fn clear_session_cookies(jar: PrivateCookieJar) -> PrivateCookieJar {
    let expired = |name| {
        Cookie::build((name, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true)
            .build()
    };

    jar.add(expired(SESSION_COOKIE))
        .add(expired(SESSION_EXPIRY_COOKIE))
}

/// Push the session expiry out to now plus `duration`, unless the current
/// expiry is already later.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::CookieMissing] if either session cookie is not in the jar.
/// - [Error::InvalidDateFormat] if the stored expiry cannot be parsed, the
///   extension would overflow the date time, or the new expiry cannot be
///   formatted.
pub(crate) fn extend_session_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry_cookie = jar.get(SESSION_EXPIRY_COOKIE).ok_or(Error::CookieMissing)?;
    let current_expiry = parse_expiry(&expiry_cookie)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| {
            Error::InvalidDateFormat("expiry overflowed".to_owned(), duration.to_string())
        })?;
    let expiry = max(current_expiry, new_expiry);
    let expiry_string = format_expiry(expiry)?;

    let mut session_cookie = jar.get(SESSION_COOKIE).ok_or(Error::CookieMissing)?;
    let mut expiry_cookie = jar.get(SESSION_EXPIRY_COOKIE).ok_or(Error::CookieMissing)?;

    session_cookie.set_expires(expiry);
    expiry_cookie.set_expires(expiry);
    expiry_cookie.set_value(expiry_string);

    Ok(jar.add(session_cookie).add(expiry_cookie))
}

/// Read the logged-in user's ID from the session cookies.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if either session cookie is not in the jar.
/// - [Error::InvalidCredentials] if the session has expired or the cookie
///   value is not a user ID.
/// - [Error::InvalidDateFormat] if the stored expiry cannot be parsed.
pub(crate) fn user_id_from_session(jar: &PrivateCookieJar) -> Result<UserID, Error> {
    let expiry_cookie = jar.get(SESSION_EXPIRY_COOKIE).ok_or(Error::CookieMissing)?;
    if parse_expiry(&expiry_cookie)? < OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    let session_cookie = jar.get(SESSION_COOKIE).ok_or(Error::CookieMissing)?;

    extract_user_id(&session_cookie).map_err(|_| Error::InvalidCredentials)
}

fn build_session_cookie(name: &'static str, value: String, expiry: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((name, value))
        .expires(expiry)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn format_expiry(expiry: OffsetDateTime) -> Result<String, Error> {
    expiry
        .format(EXPIRY_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), expiry.to_string()))
}

fn parse_expiry(cookie: &Cookie) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(cookie.value_trimmed(), EXPIRY_FORMAT).map_err(|error| {
        Error::InvalidDateFormat(error.to_string(), cookie.value_trimmed().to_owned())
    })
}

fn extract_user_id(cookie: &Cookie) -> Result<UserID, ParseIntError> {
    let id: i64 = cookie.value_trimmed().parse()?;

    Ok(UserID::new(id))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, user::UserID};

    use super::{
        DEFAULT_COOKIE_DURATION, SESSION_COOKIE, SESSION_EXPIRY_COOKIE, clear_session_cookies,
        extend_session_if_needed, parse_expiry, set_session_cookies, user_id_from_session,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    /// Test helper macro to assert that two date times are within one second
    /// of each other. Used instead of a function so that the file and line
    /// number of the caller is included in the error message instead of the
    /// helper.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(1),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[test]
    fn set_cookies_round_trips_user_id_and_expiry() {
        let jar = get_jar();
        let user_id = UserID::new(1);

        let jar = set_session_cookies(jar, user_id, DEFAULT_COOKIE_DURATION).unwrap();

        assert_eq!(user_id_from_session(&jar).unwrap(), user_id);
        let expiry_cookie = jar.get(SESSION_EXPIRY_COOKIE).unwrap();
        assert_date_time_close!(
            parse_expiry(&expiry_cookie).unwrap(),
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION
        );
    }

    #[test]
    fn user_id_fails_on_empty_jar() {
        let jar = get_jar();

        assert_eq!(user_id_from_session(&jar), Err(Error::CookieMissing));
    }

    #[test]
    fn user_id_fails_on_expired_session() {
        let jar = set_session_cookies(get_jar(), UserID::new(1), Duration::seconds(-10)).unwrap();

        assert_eq!(user_id_from_session(&jar), Err(Error::InvalidCredentials));
    }

    #[test]
    fn extend_pushes_expiry_out() {
        let jar = set_session_cookies(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = extend_session_if_needed(jar, Duration::hours(2)).unwrap();

        let session_cookie = jar.get(SESSION_COOKIE).unwrap();
        let expiry_cookie = jar.get(SESSION_EXPIRY_COOKIE).unwrap();
        let want = OffsetDateTime::now_utc() + Duration::hours(2);
        assert_date_time_close!(parse_expiry(&expiry_cookie).unwrap(), want);
        assert_date_time_close!(session_cookie.expires_datetime().unwrap(), want);
    }

    #[test]
    fn extend_keeps_later_expiry() {
        let jar = set_session_cookies(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION).unwrap();
        let stale_cookie = jar.get(SESSION_COOKIE).unwrap();
        let want = stale_cookie.expires_datetime().unwrap();

        // The session already lasts 30 minutes, so extending by 5 seconds
        // must not pull the expiry closer.
        let jar = extend_session_if_needed(jar, Duration::seconds(5)).unwrap();

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.expires_datetime(), Some(want));
    }

    #[test]
    fn clear_invalidates_the_session() {
        let jar = set_session_cookies(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = clear_session_cookies(jar);

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert!(user_id_from_session(&jar).is_err());
    }
}
