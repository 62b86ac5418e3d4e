//! Authentication routes for login, callback, userinfo and logout.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use porthole_relying_party::{AuthError, CallbackQuery, session};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use time::Duration as TimeDuration;

use super::{
    AppState, SessionCredential,
    cookies::{AUTH_STATE_COOKIE, auth_state_cookie, removal_cookie, session_cookie},
};
use crate::error::ApiError;
use crate::render::{self, ProfileFormat};

/// Builds a redirect with an explicit status; `axum::response::Redirect`
/// only offers 303, 307 and 308.
fn redirect(status: StatusCode, location: String) -> Response {
    (status, [(LOCATION, location)]).into_response()
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let redirect_to = state.flow.begin_login().await;

    // Bind the attempt to this browser for validation on callback
    let ttl = TimeDuration::seconds(state.flow.pending().ttl().num_seconds());
    let cookie = auth_state_cookie(
        redirect_to.state,
        ttl,
        state.session_config.secure_cookies,
    );

    (
        jar.add(cookie),
        redirect(StatusCode::FOUND, redirect_to.authorization_url),
    )
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let bound = match (jar.get(AUTH_STATE_COOKIE), query.state.as_deref()) {
        (Some(cookie), Some(query_state)) => {
            bool::from(cookie.value().as_bytes().ct_eq(query_state.as_bytes()))
        }
        _ => false,
    };
    if !bound {
        return Err(AuthError::StateMismatch.into());
    }

    let tokens = state.flow.complete_login(&query).await?;

    // Confirm the credential before handing it to the browser
    let profile = state.userinfo.fetch(tokens.access_token()).await?;
    tracing::info!(subject = %profile.subject, "user logged in");

    let max_age = tokens
        .expires_in()
        .and_then(|expires_in| TimeDuration::try_from(expires_in).ok())
        .unwrap_or_else(|| TimeDuration::minutes(state.session_config.max_age_minutes));
    let cookie = session_cookie(
        session::encode(&tokens),
        max_age,
        state.session_config.secure_cookies,
    );

    let jar = jar.add(cookie).add(removal_cookie(AUTH_STATE_COOKIE));

    Ok((jar, redirect(StatusCode::MOVED_PERMANENTLY, "/".to_string())))
}

/// Returns the current user's profile, re-validated at the provider.
pub async fn userinfo(
    State(state): State<Arc<AppState>>,
    SessionCredential(credential): SessionCredential,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let profile = state.userinfo.fetch(&credential).await?;
    Ok(render::profile(profile, ProfileFormat::from_headers(&headers)))
}

/// Logs out the user by clearing the session cookie.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(removal_cookie(session::SESSION_COOKIE)),
        redirect(StatusCode::FOUND, "/".to_string()),
    )
}
