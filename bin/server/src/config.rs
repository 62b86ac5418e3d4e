//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! `__` as separator, e.g. `OIDC__CLIENT_ID` or `SESSION__SECURE_COOKIES`.
//!
//! See [`OidcConfig`](porthole_relying_party::OidcConfig) for the identity
//! provider settings.

use porthole_relying_party::OidcConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Static HTML file served at `/`.
    #[serde(default = "default_landing_page")]
    pub landing_page: PathBuf,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// OIDC authentication configuration.
    pub oidc: OidcConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session cookie lifetime in minutes when the provider reports no token expiry.
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: i64,

    /// Interval between pending-login cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_landing_page() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_max_age_minutes() -> i64 {
    60
}

fn default_cleanup_interval_seconds() -> u64 {
    60
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: default_max_age_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(config::Environment::default())
    }

    fn from_source(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
