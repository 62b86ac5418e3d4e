//! Stub identity provider for tests.
//!
//! Available to this crate's unit tests and, through the `test-support`
//! feature, to downstream integration tests.

use chrono::{Duration, Utc};
use openidconnect::core::{
    CoreIdToken, CoreIdTokenClaims, CoreJwsSigningAlgorithm, CoreRsaPrivateSigningKey,
};
use openidconnect::{
    Audience, EmptyAdditionalClaims, IssuerUrl, JsonWebKeyId, Nonce, PrivateSigningKey,
    StandardClaims, SubjectIdentifier,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::OidcConfig;

/// Client id the stub expects in ID token audiences.
pub const CLIENT_ID: &str = "porthole-test";

/// Client secret configured for the stub; must never show up in output.
pub const CLIENT_SECRET: &str = "porthole-secret";

const SIGNING_KEY_PEM: &str = include_str!("../testdata/id_token_signing_key.pem");
const SIGNING_KEY_ID: &str = "porthole-test-key";

/// Returns a minimal discovery document whose endpoints live under `base_url`.
pub fn discovery_document(base_url: &str) -> Value {
    json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{base_url}/authorize"),
        "token_endpoint": format!("{base_url}/token"),
        "userinfo_endpoint": format!("{base_url}/userinfo"),
        "jwks_uri": format!("{base_url}/jwks"),
        "response_types_supported": ["code"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": ["RS256"]
    })
}

/// Returns a base URL on which nothing is listening.
pub fn unreachable_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    drop(listener);
    format!("http://{addr}")
}

fn signing_key() -> CoreRsaPrivateSigningKey {
    CoreRsaPrivateSigningKey::from_pem(
        SIGNING_KEY_PEM,
        Some(JsonWebKeyId::new(SIGNING_KEY_ID.to_string())),
    )
    .expect("test signing key should parse")
}

/// Wiremock-backed identity provider serving discovery and JWKS.
pub struct StubProvider {
    server: MockServer,
}

impl StubProvider {
    /// Starts a stub with an empty JWKS.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Starts a stub whose discovery document is adjusted by `customize`.
    pub async fn start_with(customize: impl FnOnce(&mut Value)) -> Self {
        Self::launch(customize, json!({ "keys": [] })).await
    }

    /// Starts a stub that publishes the key used by [`StubProvider::sign_id_token`].
    pub async fn start_signing() -> Self {
        let jwk = signing_key().as_verification_key();
        Self::launch(|_| {}, json!({ "keys": [jwk] })).await
    }

    async fn launch(customize: impl FnOnce(&mut Value), jwks: Value) -> Self {
        let server = MockServer::start().await;
        let mut document = discovery_document(&server.uri());
        customize(&mut document);
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Client configuration registered with this stub.
    pub fn config(&self) -> OidcConfig {
        Self::config_for(&self.uri())
    }

    pub fn config_for(issuer: &str) -> OidcConfig {
        OidcConfig::new(
            issuer.to_string(),
            CLIENT_ID.to_string(),
            CLIENT_SECRET.to_string(),
            "http://localhost:8080/callback".to_string(),
        )
    }

    /// Signs an ID token for `subject` issued by this stub, bound to `nonce`.
    pub fn sign_id_token(&self, subject: &str, nonce: &str) -> String {
        let now = Utc::now();
        let claims = CoreIdTokenClaims::new(
            IssuerUrl::new(self.uri()).expect("stub issuer URL"),
            vec![Audience::new(CLIENT_ID.to_string())],
            now + Duration::minutes(5),
            now,
            StandardClaims::new(SubjectIdentifier::new(subject.to_string())),
            EmptyAdditionalClaims {},
        )
        .set_nonce(Some(Nonce::new(nonce.to_string())));

        CoreIdToken::new(
            claims,
            &signing_key(),
            CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha256,
            None,
            None,
        )
        .expect("ID token should sign")
        .to_string()
    }

    /// Accepts `code` at the token endpoint and issues `access_token`.
    pub async fn accept_code(&self, code: &str, access_token: &str) {
        self.issue_tokens(
            code,
            json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600
            }),
        )
        .await;
    }

    /// Accepts `code` and issues `access_token` together with `id_token`.
    pub async fn accept_code_with_id_token(&self, code: &str, access_token: &str, id_token: &str) {
        self.issue_tokens(
            code,
            json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600,
                "id_token": id_token
            }),
        )
        .await;
    }

    async fn issue_tokens(&self, code: &str, response: Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(format!("code={code}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Fails the test if the token endpoint is ever called.
    pub async fn forbid_exchange(&self) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Answers userinfo requests bearing `access_token` with `profile`.
    pub async fn accept_token(&self, access_token: &str, profile: Value) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", format!("Bearer {access_token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&self.server)
            .await;
    }

    /// Rejects userinfo requests bearing `access_token` with `status`.
    pub async fn reject_token(&self, access_token: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", format!("Bearer {access_token}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": "invalid_token",
                "error_description": "The access token expired"
            })))
            .mount(&self.server)
            .await;
    }
}
