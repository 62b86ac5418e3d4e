//! Error types for the server binary and HTTP status mapping.
//!
//! Handlers return [`ApiError`], which wraps the library's
//! `Report<AuthError>` and decides the status code. Response bodies are
//! fixed strings; the report itself only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use porthole_relying_party::{AuthError, session::SESSION_COOKIE};
use rootcause::prelude::Report;
use std::fmt;

use crate::auth::cookies::removal_cookie;

/// A failed request, carrying the full error report.
#[derive(Debug)]
pub struct ApiError(pub Report<AuthError>);

impl ApiError {
    /// Returns the underlying authentication error.
    pub fn kind(&self) -> &AuthError {
        self.0.current_context()
    }

    /// Status code and public message for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self.kind() {
            AuthError::StateMismatch => (StatusCode::BAD_REQUEST, "Invalid login state"),
            AuthError::AuthorizationDenied { .. } => (StatusCode::FORBIDDEN, "Access denied"),
            AuthError::ExchangeFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            AuthError::MissingCredential | AuthError::Unauthorized { .. } => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AuthError::ProviderUnavailable { .. } => (
                StatusCode::BAD_GATEWAY,
                "Identity provider is unavailable",
            ),
            AuthError::Configuration { .. } | AuthError::DiscoveryFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<Report<AuthError>> for ApiError {
    fn from(report: Report<AuthError>) -> Self {
        Self(report)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        // A credential the provider refused is dead; a provider outage is not.
        if self.kind().invalidates_session() {
            let jar = CookieJar::new().add(removal_cookie(SESSION_COOKIE));
            return (status, jar, message).into_response();
        }

        (status, message).into_response()
    }
}

/// Errors that stop the server from starting or serving.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded from the environment.
    Config { reason: String },
    /// The identity provider could not be resolved.
    Provider { reason: String },
    /// The listen address could not be bound.
    Bind { addr: String, reason: String },
    /// The server loop exited with an I/O error.
    Serve { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Provider { reason } => {
                write!(f, "failed to resolve identity provider: {reason}")
            }
            Self::Bind { addr, reason } => write!(f, "failed to bind to {addr}: {reason}"),
            Self::Serve { reason } => write!(f, "server error: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}
