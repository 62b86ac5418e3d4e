//! Authorization code flow: login initiation and callback completion.

use openidconnect::core::CoreAuthenticationFlow;
use openidconnect::{
    AuthorizationCode, CsrfToken, Nonce, OAuth2TokenResponse, PkceCodeChallenge,
    PkceCodeVerifier, Scope, TokenResponse,
};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::AuthError;
use crate::pending::{PendingLogin, PendingLogins};
use crate::provider::Provider;
use crate::token::{BearerCredential, TokenSet};

/// Bytes of randomness in each `state` value.
const STATE_BYTES: u32 = 32;

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Where to send the browser to start a login.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// Provider authorization URL including all query parameters.
    pub authorization_url: String,
    /// The `state` value embedded in the URL.
    pub state: String,
}

/// Drives the authorization code flow against the resolved provider.
pub struct AuthorizationFlow {
    provider: Arc<Provider>,
    pending: PendingLogins,
}

impl AuthorizationFlow {
    /// Creates a flow controller with an empty pending-login registry.
    #[must_use]
    pub fn new(provider: Arc<Provider>) -> Self {
        let config = provider.config();
        let pending = PendingLogins::new(config.login_state_ttl(), config.max_pending_logins());
        Self { provider, pending }
    }

    /// Returns the pending-login registry.
    #[must_use]
    pub fn pending(&self) -> &PendingLogins {
        &self.pending
    }

    /// Starts a login attempt.
    ///
    /// Generates a fresh `state`, nonce and PKCE verifier, records them as
    /// pending and returns the provider authorization URL.
    pub async fn begin_login(&self) -> LoginRedirect {
        let config = self.provider.config();
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .provider
            .client()
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                || CsrfToken::new_random_len(STATE_BYTES),
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // openid is always sent by the flow itself
        for scope in config.scopes().into_iter().filter(|s| *s != "openid") {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        if config.offline_access() {
            request = request.add_extra_param("access_type", "offline");
        }

        let (authorization_url, csrf_token, nonce) = request.url();
        let state = csrf_token.secret().clone();

        self.pending
            .insert(
                state.clone(),
                PendingLogin::new(nonce.secret().clone(), pkce_verifier.secret().clone()),
            )
            .await;
        debug!("login started");

        LoginRedirect {
            authorization_url: authorization_url.to_string(),
            state,
        }
    }

    /// Completes a login attempt from the callback query.
    ///
    /// The `state` must match a pending, unexpired entry; the entry is consumed
    /// before anything else happens, so a replayed callback always fails with
    /// `StateMismatch`. The code exchange is never retried.
    ///
    /// # Errors
    ///
    /// - `StateMismatch` if `state` is absent, unknown, expired or consumed.
    /// - `AuthorizationDenied` if the provider returned an error instead of a code.
    /// - `ExchangeFailed` if the token endpoint rejects the code or the ID token
    ///   fails verification.
    #[instrument(skip_all)]
    pub async fn complete_login(
        &self,
        query: &CallbackQuery,
    ) -> Result<TokenSet, Report<AuthError>> {
        let state = query.state.as_deref().ok_or(AuthError::StateMismatch)?;
        let pending = self
            .pending
            .take(state)
            .await
            .ok_or(AuthError::StateMismatch)?;

        if let Some(error) = &query.error {
            warn!(
                error = %error,
                description = query.error_description.as_deref().unwrap_or_default(),
                "provider returned an authorization error"
            );
            return Err(AuthError::AuthorizationDenied {
                error: error.clone(),
            }
            .into());
        }

        let code = query
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AuthError::ExchangeFailed {
                reason: "callback carried no authorization code".to_string(),
            })?;

        let client = self.provider.client();
        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| AuthError::ExchangeFailed {
                reason: format!("token endpoint error: {e}"),
            })?
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier().to_string()))
            .request_async(self.provider.http_client())
            .await
            .map_err(|e| AuthError::ExchangeFailed {
                reason: e.to_string(),
            })?;

        let id_token = match token_response.id_token() {
            Some(id_token) => {
                let nonce = Nonce::new(pending.nonce().to_string());
                id_token
                    .claims(&client.id_token_verifier(), &nonce)
                    .map_err(|e| AuthError::ExchangeFailed {
                        reason: format!("ID token validation failed: {e}"),
                    })?;
                Some(id_token.to_string())
            }
            None => None,
        };

        debug!(has_id_token = id_token.is_some(), "authorization code exchanged");

        Ok(TokenSet::new(
            BearerCredential::new(token_response.access_token().secret().clone()),
            token_response.token_type().as_ref().to_string(),
        )
        .with_id_token(id_token)
        .with_expires_in(token_response.expires_in()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubProvider;
    use std::collections::{HashMap, HashSet};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    async fn flow_for(stub: &StubProvider) -> AuthorizationFlow {
        let provider = Provider::resolve(stub.config())
            .await
            .expect("provider should resolve");
        AuthorizationFlow::new(Arc::new(provider))
    }

    fn query_params(url: &str) -> HashMap<String, String> {
        let parsed = reqwest::Url::parse(url).expect("authorization URL should parse");
        parsed.query_pairs().into_owned().collect()
    }

    fn callback(code: &str, state: &str) -> CallbackQuery {
        CallbackQuery {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            ..CallbackQuery::default()
        }
    }

    #[tokio::test]
    async fn begin_login_builds_authorization_url() {
        let stub = StubProvider::start().await;
        let flow = flow_for(&stub).await;

        let redirect = flow.begin_login().await;

        assert!(
            redirect
                .authorization_url
                .starts_with(&format!("{}/authorize?", stub.uri()))
        );
        let params = query_params(&redirect.authorization_url);
        assert_eq!(params["client_id"], "porthole-test");
        assert_eq!(params["redirect_uri"], "http://localhost:8080/callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], redirect.state);
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["code_challenge_method"], "S256");
        assert!(params.contains_key("nonce"));
        let scopes: Vec<&str> = params["scope"].split(' ').collect();
        assert!(scopes.contains(&"openid"));
        assert!(scopes.contains(&"email"));
        assert!(scopes.contains(&"profile"));
        assert_eq!(scopes.iter().filter(|s| **s == "openid").count(), 1);
        assert_eq!(flow.pending().len().await, 1);
    }

    #[tokio::test]
    async fn state_values_never_collide() {
        let stub = StubProvider::start().await;
        let flow = flow_for(&stub).await;

        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let redirect = flow.begin_login().await;
            // 32 random bytes, base64url without padding
            assert_eq!(redirect.state.len(), 43);
            assert!(seen.insert(redirect.state));
        }
    }

    #[tokio::test]
    async fn complete_login_exchanges_code_once() {
        let stub = StubProvider::start().await;
        stub.accept_code("ABC", "access-u1").await;
        let flow = flow_for(&stub).await;
        let redirect = flow.begin_login().await;

        let tokens = flow
            .complete_login(&callback("ABC", &redirect.state))
            .await
            .expect("login should complete");

        assert_eq!(tokens.access_token().secret(), "access-u1");
        assert_eq!(tokens.token_type(), "bearer");
        assert_eq!(
            tokens.expires_in(),
            Some(std::time::Duration::from_secs(3600))
        );

        let replay = flow
            .complete_login(&callback("ABC", &redirect.state))
            .await
            .err()
            .expect("replayed state must fail");
        assert_eq!(replay.current_context(), &AuthError::StateMismatch);
    }

    #[tokio::test]
    async fn mismatched_state_is_rejected_before_exchange() {
        let stub = StubProvider::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(stub.server())
            .await;
        let flow = flow_for(&stub).await;
        flow.begin_login().await;

        let err = flow
            .complete_login(&callback("ABC", "WRONG"))
            .await
            .err()
            .expect("wrong state must fail");
        assert_eq!(err.current_context(), &AuthError::StateMismatch);

        let missing = flow
            .complete_login(&CallbackQuery {
                code: Some("ABC".to_string()),
                ..CallbackQuery::default()
            })
            .await
            .err()
            .expect("absent state must fail");
        assert_eq!(missing.current_context(), &AuthError::StateMismatch);
        assert_eq!(flow.pending().len().await, 1);
    }

    #[tokio::test]
    async fn rejected_code_is_exchange_failure() {
        let stub = StubProvider::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .expect(1)
            .mount(stub.server())
            .await;
        let flow = flow_for(&stub).await;
        let redirect = flow.begin_login().await;

        let err = flow
            .complete_login(&callback("EXPIRED", &redirect.state))
            .await
            .err()
            .expect("rejected code must fail");

        assert!(matches!(
            err.current_context(),
            AuthError::ExchangeFailed { .. }
        ));
        assert!(!err.to_string().contains("porthole-secret"));
    }

    #[tokio::test]
    async fn signed_id_token_bound_to_nonce_is_accepted() {
        let stub = StubProvider::start_signing().await;
        let flow = flow_for(&stub).await;
        let redirect = flow.begin_login().await;
        let nonce = query_params(&redirect.authorization_url)["nonce"].clone();
        let id_token = stub.sign_id_token("u1", &nonce);
        stub.accept_code_with_id_token("ABC", "access-u1", &id_token).await;

        let tokens = flow
            .complete_login(&callback("ABC", &redirect.state))
            .await
            .expect("login should complete");

        assert_eq!(tokens.id_token(), Some(id_token.as_str()));
        assert_eq!(tokens.access_token().secret(), "access-u1");
    }

    #[tokio::test]
    async fn id_token_with_foreign_nonce_fails_exchange() {
        let stub = StubProvider::start_signing().await;
        let flow = flow_for(&stub).await;
        let redirect = flow.begin_login().await;
        let id_token = stub.sign_id_token("u1", "nonce-from-another-login");
        stub.accept_code_with_id_token("ABC", "access-u1", &id_token).await;

        let err = flow
            .complete_login(&callback("ABC", &redirect.state))
            .await
            .err()
            .expect("foreign nonce must fail");

        assert!(matches!(
            err.current_context(),
            AuthError::ExchangeFailed { .. }
        ));
        assert!(!err.to_string().contains(&id_token));
    }

    #[tokio::test]
    async fn id_token_signed_by_unknown_key_fails_exchange() {
        // Publishes an empty JWKS, so no signature can verify
        let stub = StubProvider::start().await;
        let flow = flow_for(&stub).await;
        let redirect = flow.begin_login().await;
        let nonce = query_params(&redirect.authorization_url)["nonce"].clone();
        let id_token = stub.sign_id_token("u1", &nonce);
        stub.accept_code_with_id_token("ABC", "access-u1", &id_token).await;

        let err = flow
            .complete_login(&callback("ABC", &redirect.state))
            .await
            .err()
            .expect("unverifiable ID token must fail");

        assert!(matches!(
            err.current_context(),
            AuthError::ExchangeFailed { .. }
        ));
        assert!(flow.pending().is_empty().await);
    }

    #[tokio::test]
    async fn provider_error_consumes_state() {
        let stub = StubProvider::start().await;
        let flow = flow_for(&stub).await;
        let redirect = flow.begin_login().await;

        let query = CallbackQuery {
            state: Some(redirect.state.clone()),
            error: Some("access_denied".to_string()),
            ..CallbackQuery::default()
        };
        let err = flow
            .complete_login(&query)
            .await
            .err()
            .expect("provider error must fail");

        assert_eq!(
            err.current_context(),
            &AuthError::AuthorizationDenied {
                error: "access_denied".to_string()
            }
        );
        assert!(flow.pending().is_empty().await);
    }
}
