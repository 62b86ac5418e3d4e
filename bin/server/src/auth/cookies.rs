//! Cookie attributes for the session and login-binding cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration as TimeDuration;

/// Auth state cookie name (binds a pending login to the browser that started it).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Builds the session cookie carrying the encoded credential.
pub fn session_cookie(value: String, max_age: TimeDuration, secure: bool) -> Cookie<'static> {
    Cookie::build((porthole_relying_party::session::SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Builds the short-lived cookie holding the login `state`.
pub fn auth_state_cookie(state: String, max_age: TimeDuration, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_STATE_COOKIE, state))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Builds a cookie that makes the browser drop `name`.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .max_age(TimeDuration::ZERO)
        .build()
}
