//! Authentication module for the porthole server.
//!
//! This module provides:
//! - Login initiation and callback handling against the identity provider
//! - Cookie policy for the session and login-binding cookies
//! - A session-credential extractor for protected routes
//!
//! # Session Model
//!
//! The server holds no session store. The `jwt` cookie carries the provider's
//! access token, and every protected request re-validates it at the provider's
//! userinfo endpoint:
//! - Revocation at the provider is visible on the next request
//! - A provider outage surfaces as 502 without discarding the cookie
//! - The only shared mutable state is the pending-login registry

pub mod cookies;
pub mod middleware;
pub mod routes;

use crate::config::SessionConfig;
use porthole_relying_party::{AuthorizationFlow, Provider, UserInfoGateway};
use std::sync::Arc;

pub use middleware::SessionCredential;
pub use routes::{callback, login, logout, userinfo};

/// Shared application state.
pub struct AppState {
    /// Authorization code flow controller.
    pub flow: AuthorizationFlow,
    /// Userinfo gateway used to validate sessions.
    pub userinfo: UserInfoGateway,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state around a resolved provider.
    pub fn new(provider: Arc<Provider>, session_config: SessionConfig) -> Self {
        Self {
            flow: AuthorizationFlow::new(provider.clone()),
            userinfo: UserInfoGateway::new(provider),
            session_config,
        }
    }
}
