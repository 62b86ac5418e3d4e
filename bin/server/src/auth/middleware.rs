//! Authentication extractors for Axum.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use porthole_relying_party::{BearerCredential, session};

use crate::error::ApiError;

/// Extractor for the bearer credential carried in the session cookie.
///
/// Only decodes the cookie. Handlers must still present the credential to
/// the provider before trusting it.
pub struct SessionCredential(pub BearerCredential);

impl<S> FromRequestParts<S> for SessionCredential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let credential = session::decode(
            jar.get(session::SESSION_COOKIE)
                .map(|cookie| cookie.value()),
        )?;
        Ok(SessionCredential(credential))
    }
}
