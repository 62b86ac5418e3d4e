//! Router assembly.

use axum::{Router, routing::get};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeFile, trace::TraceLayer};

use crate::auth::{self, AppState};

/// Builds the application router.
///
/// `/` serves `landing_page` as-is; everything else is an auth route.
pub fn router(state: Arc<AppState>, landing_page: impl AsRef<Path>) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(landing_page))
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/userinfo", get(auth::userinfo))
        .route("/logout", get(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
