//! Shared fixtures: an in-process router against the stub identity provider.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, Response, header},
};
use porthole_relying_party::Provider;
use porthole_server::{app, auth::AppState, config::SessionConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub use porthole_relying_party::test_support::{StubProvider, unreachable_uri};

pub fn u1_profile() -> Value {
    json!({
        "sub": "u1",
        "email": "u1@example.com",
        "email_verified": true,
        "name": "User One"
    })
}

/// Builds the application router against `stub`.
pub async fn router_for(stub: &StubProvider) -> Router {
    let provider = Provider::resolve(stub.config())
        .await
        .expect("provider should resolve");
    let state = Arc::new(AppState::new(Arc::new(provider), SessionConfig::default()));
    app::router(state, concat!(env!("CARGO_MANIFEST_DIR"), "/index.html"))
}

/// Sends a GET request, optionally with a `Cookie` header.
pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    get_with(app, uri, cookie, &[]).await
}

/// Sends a GET request with extra headers.
pub async fn get_with(
    app: &Router,
    uri: &str,
    cookie: Option<&str>,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).expect("valid request"))
        .await
        .expect("router is infallible")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location(headers: &HeaderMap) -> String {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
        .to_string()
}

/// Returns the full `Set-Cookie` header for `name`, if any.
pub fn set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}

/// Returns the `name=value` pair of a `Set-Cookie` header for use in `Cookie`.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Extracts a query parameter from an absolute URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
