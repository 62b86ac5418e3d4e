//! Token types produced by the authorization code exchange.

use std::fmt;
use std::time::Duration;

/// Bearer access token presented to the provider.
///
/// The token value is never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    /// Wraps a raw access token.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential([redacted])")
    }
}

/// Tokens issued by the provider on a successful code exchange.
#[derive(Clone)]
pub struct TokenSet {
    access_token: BearerCredential,
    id_token: Option<String>,
    token_type: String,
    expires_in: Option<Duration>,
}

impl TokenSet {
    /// Creates a token set holding only an access token.
    #[must_use]
    pub fn new(access_token: BearerCredential, token_type: String) -> Self {
        Self {
            access_token,
            id_token: None,
            token_type,
            expires_in: None,
        }
    }

    /// Sets the raw ID token.
    #[must_use]
    pub fn with_id_token(mut self, id_token: Option<String>) -> Self {
        self.id_token = id_token;
        self
    }

    /// Sets the access token lifetime reported by the provider.
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: Option<Duration>) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &BearerCredential {
        &self.access_token
    }

    /// Returns the raw ID token, if the provider issued one.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Returns the token type (normally "bearer").
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns the access token lifetime, if known.
    #[must_use]
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &self.access_token)
            .field("has_id_token", &self.id_token.is_some())
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
