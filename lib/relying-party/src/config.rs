//! Relying-party client configuration.
//!
//! This module provides the configuration used to register porthole with a
//! single external OIDC identity provider. The configuration is built once at
//! startup and shared read-only with every component afterwards.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Configuration for the OIDC identity provider and this client's registration.
///
/// Fields with defaults can be omitted when loading from environment variables.
/// The client secret is never included in the `Debug` output.
#[derive(Clone, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL (e.g., "https://accounts.google.com").
    /// Used for OIDC discovery.
    #[serde(default = "default_issuer_url")]
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The redirect URI for the OAuth2 callback (e.g., "http://localhost:8080/callback").
    #[serde(default = "default_redirect_uri")]
    redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,profile,email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Whether to request offline access (`access_type=offline`).
    #[serde(default = "default_offline_access")]
    offline_access: bool,
    /// Timeout for every outbound call to the provider, in seconds.
    #[serde(default = "default_http_timeout_seconds")]
    http_timeout_seconds: u64,
    /// How long a login attempt may stay pending before its state expires, in seconds.
    #[serde(default = "default_login_state_ttl_seconds")]
    login_state_ttl_seconds: i64,
    /// Upper bound on concurrently pending login attempts.
    #[serde(default = "default_max_pending_logins")]
    max_pending_logins: usize,
}

fn default_issuer_url() -> String {
    "https://accounts.google.com".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/callback".to_string()
}

fn default_scopes() -> String {
    "openid,profile,email".to_string()
}

fn default_offline_access() -> bool {
    true
}

fn default_http_timeout_seconds() -> u64 {
    10
}

fn default_login_state_ttl_seconds() -> i64 {
    600
}

fn default_max_pending_logins() -> usize {
    10_000
}

impl OidcConfig {
    /// Creates a new OIDC configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes(),
            offline_access: default_offline_access(),
            http_timeout_seconds: default_http_timeout_seconds(),
            login_state_ttl_seconds: default_login_state_ttl_seconds(),
            max_pending_logins: default_max_pending_logins(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> OidcConfigBuilder {
        OidcConfigBuilder::new(issuer_url, client_id, client_secret, redirect_uri)
    }

    /// Returns the OIDC issuer URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns true if offline access should be requested.
    #[must_use]
    pub fn offline_access(&self) -> bool {
        self.offline_access
    }

    /// Returns the timeout applied to provider calls, never less than one second.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds.max(1))
    }

    /// Returns how long a pending login stays valid.
    #[must_use]
    pub fn login_state_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.login_state_ttl_seconds)
    }

    /// Returns the maximum number of pending logins kept at once.
    #[must_use]
    pub fn max_pending_logins(&self) -> usize {
        self.max_pending_logins
    }
}

impl fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OidcConfig")
            .field("issuer_url", &self.issuer_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("offline_access", &self.offline_access)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("login_state_ttl_seconds", &self.login_state_ttl_seconds)
            .field("max_pending_logins", &self.max_pending_logins)
            .finish()
    }
}

/// Builder for `OidcConfig`.
#[derive(Debug)]
pub struct OidcConfigBuilder {
    config: OidcConfig,
    scopes: Vec<String>,
}

impl OidcConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            config: OidcConfig::new(issuer_url, client_id, client_secret, redirect_uri),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
        }
    }

    /// Sets the OAuth2 scopes to request.
    #[must_use]
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Adds a scope to the list of scopes to request.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Sets whether offline access is requested.
    #[must_use]
    pub fn offline_access(mut self, enabled: bool) -> Self {
        self.config.offline_access = enabled;
        self
    }

    /// Sets the provider call timeout, rounded up to whole seconds.
    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout_seconds =
            timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    /// Sets the pending login lifetime.
    #[must_use]
    pub fn login_state_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.config.login_state_ttl_seconds = ttl.num_seconds();
        self
    }

    /// Sets the maximum number of pending logins.
    #[must_use]
    pub fn max_pending_logins(mut self, max: usize) -> Self {
        self.config.max_pending_logins = max;
        self
    }

    /// Builds the `OidcConfig`.
    #[must_use]
    pub fn build(mut self) -> OidcConfig {
        self.config.scopes = self.scopes.join(",");
        self.config
    }
}
