//! UserInfo gateway: the sole authority on whether a session is still valid.

use openidconnect::core::CoreUserInfoClaims;
use openidconnect::http::StatusCode;
use openidconnect::{AccessToken, UserInfoError};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::AuthError;
use crate::provider::Provider;
use crate::token::BearerCredential;

/// Profile of the authenticated end user.
///
/// Derived fresh from each userinfo call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable unique identifier assigned by the provider.
    pub subject: String,
    pub email: Option<String>,
    /// Display name (from name or preferred_username).
    pub display_name: Option<String>,
    pub email_verified: Option<bool>,
}

impl UserProfile {
    fn from_claims(claims: &CoreUserInfoClaims) -> Self {
        let display_name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()));

        Self {
            subject: claims.subject().as_str().to_string(),
            email: claims.email().map(|e| e.as_str().to_string()),
            display_name,
            email_verified: claims.email_verified(),
        }
    }
}

/// Calls the provider's userinfo endpoint with a bearer credential.
#[derive(Clone)]
pub struct UserInfoGateway {
    provider: Arc<Provider>,
}

impl UserInfoGateway {
    /// Creates a gateway for the resolved provider.
    #[must_use]
    pub fn new(provider: Arc<Provider>) -> Self {
        Self { provider }
    }

    /// Fetches the profile for `credential`.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the provider rejects the credential (400, 401, 403).
    /// - `ProviderUnavailable` on network failure, timeout, any other status or an
    ///   unreadable response.
    #[instrument(skip_all)]
    pub async fn fetch(
        &self,
        credential: &BearerCredential,
    ) -> Result<UserProfile, Report<AuthError>> {
        let request = self
            .provider
            .client()
            .user_info(AccessToken::new(credential.secret().to_string()), None)
            .map_err(|e| AuthError::Configuration {
                reason: format!("userinfo endpoint unavailable: {e}"),
            })?;

        let claims: CoreUserInfoClaims = request
            .request_async(self.provider.http_client())
            .await
            .map_err(classify)?;

        let profile = UserProfile::from_claims(&claims);
        debug!(subject = %profile.subject, "fetched user profile");
        Ok(profile)
    }
}

/// Statuses with which RFC 6750 reports a bad bearer token.
///
/// Other 4xx answers (408, 429, 404...) say nothing about the credential.
fn rejects_credential(status: StatusCode) -> bool {
    matches!(status.as_u16(), 400 | 401 | 403)
}

/// Separates credential rejection from provider failure.
fn classify<RE>(err: UserInfoError<RE>) -> AuthError
where
    RE: std::error::Error + 'static,
{
    match err {
        UserInfoError::Response(status, _, _) if rejects_credential(status) => {
            debug!(status = status.as_u16(), "provider rejected credential");
            AuthError::Unauthorized {
                status: status.as_u16(),
            }
        }
        UserInfoError::Response(status, _, _) => {
            warn!(status = status.as_u16(), "userinfo endpoint failed");
            AuthError::ProviderUnavailable {
                reason: format!("userinfo endpoint returned {status}"),
            }
        }
        other => {
            warn!(error = %other, "userinfo request failed");
            AuthError::ProviderUnavailable {
                reason: other.to_string(),
            }
        }
    }
}
