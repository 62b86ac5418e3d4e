//! Error types for the relying-party crate.
//!
//! Errors are designed for layered context using rootcause: operations return
//! `Report<AuthError>` and callers inspect the current context to decide how a
//! failure is surfaced. Variant payloads carry diagnostic details only; they
//! never contain client secrets or raw tokens.

use std::fmt;

/// Errors from the authentication session protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Local configuration is unusable (invalid URLs, HTTP client setup).
    Configuration { reason: String },
    /// Provider metadata could not be fetched or failed validation.
    DiscoveryFailed { reason: String },
    /// Callback `state` was absent, unknown, expired or already consumed.
    StateMismatch,
    /// The provider reported an error on the callback instead of a code.
    AuthorizationDenied { error: String },
    /// The authorization code could not be exchanged for tokens.
    ExchangeFailed { reason: String },
    /// No session credential was presented.
    MissingCredential,
    /// The provider rejected the presented credential.
    Unauthorized { status: u16 },
    /// The provider could not be reached or failed while validating.
    ProviderUnavailable { reason: String },
}

impl AuthError {
    /// Returns true if the local session must be discarded.
    #[must_use]
    pub fn invalidates_session(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "OIDC configuration error: {reason}")
            }
            Self::DiscoveryFailed { reason } => {
                write!(f, "OIDC discovery failed: {reason}")
            }
            Self::StateMismatch => {
                write!(f, "authorization state mismatch")
            }
            Self::AuthorizationDenied { error } => {
                write!(f, "provider denied authorization: {error}")
            }
            Self::ExchangeFailed { reason } => {
                write!(f, "authorization code exchange failed: {reason}")
            }
            Self::MissingCredential => {
                write!(f, "no session credential presented")
            }
            Self::Unauthorized { status } => {
                write!(f, "provider rejected credential with status {status}")
            }
            Self::ProviderUnavailable { reason } => {
                write!(f, "identity provider unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_mismatch_display_is_generic() {
        let err = AuthError::StateMismatch;
        assert_eq!(err.to_string(), "authorization state mismatch");
    }

    #[test]
    fn unauthorized_display_includes_status() {
        let err = AuthError::Unauthorized { status: 401 };
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn provider_unavailable_display() {
        let err = AuthError::ProviderUnavailable {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("unavailable"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn only_unauthorized_invalidates_session() {
        assert!(AuthError::Unauthorized { status: 401 }.invalidates_session());
        assert!(
            !AuthError::ProviderUnavailable {
                reason: "timeout".to_string()
            }
            .invalidates_session()
        );
        assert!(!AuthError::MissingCredential.invalidates_session());
    }
}
