//! OpenID Connect relying-party session protocol for porthole.
//!
//! This crate provides:
//! - Provider metadata resolution via discovery (`Provider`)
//! - The authorization code flow with single-use anti-forgery state
//!   (`AuthorizationFlow`, `PendingLogins`)
//! - The session codec for the client-held cookie (`session`)
//! - Profile retrieval and credential re-validation (`UserInfoGateway`)
//!
//! # Session Model
//!
//! The server keeps no session records. The session cookie carries the
//! provider-issued access token and every protected request presents it to
//! the provider's userinfo endpoint, so revocation at the provider takes
//! effect on the very next request.
//!
//! # Example
//!
//! ```no_run
//! use porthole_relying_party::{AuthorizationFlow, OidcConfig, Provider, UserInfoGateway};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), rootcause::Report<porthole_relying_party::AuthError>> {
//! let config = OidcConfig::new(
//!     "https://accounts.google.com".to_string(),
//!     "client-id".to_string(),
//!     "client-secret".to_string(),
//!     "http://localhost:8080/callback".to_string(),
//! );
//! let provider = Arc::new(Provider::resolve(config).await?);
//! let flow = AuthorizationFlow::new(provider.clone());
//! let userinfo = UserInfoGateway::new(provider);
//!
//! let redirect = flow.begin_login().await;
//! println!("send the browser to {}", redirect.authorization_url);
//! # let _ = userinfo;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod flow;
pub mod pending;
pub mod provider;
pub mod session;
pub mod token;
pub mod userinfo;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-export main types at crate root
pub use config::{OidcConfig, OidcConfigBuilder};
pub use error::AuthError;
pub use flow::{AuthorizationFlow, CallbackQuery, LoginRedirect};
pub use pending::{PendingLogin, PendingLogins};
pub use provider::Provider;
pub use token::{BearerCredential, TokenSet};
pub use userinfo::{UserInfoGateway, UserProfile};
