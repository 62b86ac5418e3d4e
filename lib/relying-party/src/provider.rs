//! Provider metadata resolution via OIDC discovery.
//!
//! The provider is resolved once at startup. Its metadata, the OIDC client
//! built from it and the outbound HTTP client are immutable afterwards and are
//! shared by handle with the flow controller and the userinfo gateway.

use openidconnect::core::{CoreClient, CoreProviderMetadata};
use openidconnect::{
    ClientId, ClientSecret, EndpointMaybeSet, EndpointNotSet, EndpointSet, IssuerUrl, RedirectUrl,
};
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::OidcConfig;
use crate::error::AuthError;

/// OIDC client with the authorization endpoint set and the token and userinfo
/// endpoints taken from discovery.
pub(crate) type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// Resolved identity provider.
pub struct Provider {
    metadata: CoreProviderMetadata,
    client: DiscoveredClient,
    http_client: reqwest::Client,
    config: OidcConfig,
}

impl Provider {
    /// Discovers the provider described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` for unusable local settings and
    /// `AuthError::DiscoveryFailed` if the discovery document cannot be fetched,
    /// names a different issuer, or lacks the token or userinfo endpoint.
    #[instrument(skip(config), fields(issuer = %config.issuer_url()))]
    pub async fn resolve(config: OidcConfig) -> Result<Self, Report<AuthError>> {
        let issuer_url =
            IssuerUrl::new(config.issuer_url().to_string()).map_err(|e| {
                AuthError::Configuration {
                    reason: format!("invalid issuer URL: {e}"),
                }
            })?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            AuthError::Configuration {
                reason: format!("invalid redirect URI: {e}"),
            }
        })?;

        let http_client = build_http_client(config.http_timeout())?;

        let metadata = CoreProviderMetadata::discover_async(issuer_url.clone(), &http_client)
            .await
            .map_err(|e| AuthError::DiscoveryFailed {
                reason: e.to_string(),
            })?;

        if metadata.issuer().url() != issuer_url.url() {
            return Err(AuthError::DiscoveryFailed {
                reason: format!(
                    "discovery document names issuer '{}'",
                    metadata.issuer().url()
                ),
            }
            .into());
        }
        if metadata.token_endpoint().is_none() {
            return Err(AuthError::DiscoveryFailed {
                reason: "discovery document has no token endpoint".to_string(),
            }
            .into());
        }
        if metadata.userinfo_endpoint().is_none() {
            return Err(AuthError::DiscoveryFailed {
                reason: "discovery document has no userinfo endpoint".to_string(),
            }
            .into());
        }

        let client = CoreClient::from_provider_metadata(
            metadata.clone(),
            ClientId::new(config.client_id().to_string()),
            Some(ClientSecret::new(config.client_secret().to_string())),
        )
        .set_redirect_uri(redirect_url);

        info!(
            signing_keys = metadata.jwks().keys().len(),
            "resolved OIDC provider"
        );

        Ok(Self {
            metadata,
            client,
            http_client,
            config,
        })
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        self.metadata.issuer().url().as_str()
    }

    /// Returns the authorization endpoint URL.
    #[must_use]
    pub fn authorization_endpoint(&self) -> &str {
        self.metadata.authorization_endpoint().url().as_str()
    }

    /// Returns the token endpoint URL.
    #[must_use]
    pub fn token_endpoint(&self) -> Option<&str> {
        self.metadata.token_endpoint().map(|url| url.url().as_str())
    }

    /// Returns the userinfo endpoint URL.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> Option<&str> {
        self.metadata.userinfo_endpoint().map(|url| url.url().as_str())
    }

    /// Returns the number of signing keys published by the provider.
    #[must_use]
    pub fn signing_key_count(&self) -> usize {
        self.metadata.jwks().keys().len()
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &DiscoveredClient {
        &self.client
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}

/// Builds the outbound HTTP client used for every provider call.
///
/// Redirects are never followed.
fn build_http_client(timeout: Duration) -> Result<reqwest::Client, Report<AuthError>> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()
        .map_err(|e| {
            AuthError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            }
            .into()
        })
}
