//! porthole web server.
//!
//! This crate provides the HTTP edge of the porthole relying party: a static
//! landing page plus the login, callback, userinfo and logout routes.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod render;
