//! Session codec for the client-held session cookie.
//!
//! The session is nothing more than the bearer access token, carried
//! base64url-encoded in a cookie. Decoding only recovers the credential; it
//! never asserts validity. Every protected request re-validates the credential
//! against the provider through the userinfo gateway.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rootcause::prelude::Report;

use crate::error::AuthError;
use crate::token::{BearerCredential, TokenSet};

/// Name of the session cookie.
///
/// The cookie holds an opaque access token, not necessarily a JWT.
pub const SESSION_COOKIE: &str = "jwt";

/// Encodes the credential needed for re-validation into a cookie value.
#[must_use]
pub fn encode(tokens: &TokenSet) -> String {
    URL_SAFE_NO_PAD.encode(tokens.access_token().secret())
}

/// Recovers the bearer credential from a session cookie value.
///
/// # Errors
///
/// Returns `AuthError::MissingCredential` if no cookie was presented or its
/// value is not something `encode` produced.
pub fn decode(cookie_value: Option<&str>) -> Result<BearerCredential, Report<AuthError>> {
    let value = cookie_value
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredential)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| AuthError::MissingCredential)?;
    let token = String::from_utf8(bytes).map_err(|_| AuthError::MissingCredential)?;
    if token.is_empty() {
        return Err(AuthError::MissingCredential.into());
    }

    Ok(BearerCredential::new(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access_token: &str) -> TokenSet {
        TokenSet::new(
            BearerCredential::new(access_token.to_string()),
            "bearer".to_string(),
        )
    }

    #[test]
    fn decode_recovers_encoded_token() {
        let token = "ya29.a0Af+H/s=;opaque";
        let cookie = encode(&tokens(token));

        assert!(
            cookie
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        let credential = decode(Some(&cookie)).expect("should decode");
        assert_eq!(credential.secret(), token);
    }

    #[test]
    fn absent_cookie_is_missing_credential() {
        let err = decode(None).expect_err("no cookie");
        assert_eq!(err.current_context(), &AuthError::MissingCredential);

        let err = decode(Some("")).expect_err("empty cookie");
        assert_eq!(err.current_context(), &AuthError::MissingCredential);
    }

    #[test]
    fn garbage_cookie_is_missing_credential() {
        let err = decode(Some("not base64 !!")).expect_err("garbage");
        assert_eq!(err.current_context(), &AuthError::MissingCredential);
    }
}
