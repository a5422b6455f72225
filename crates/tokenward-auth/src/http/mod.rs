//! HTTP handlers for the session token endpoints.
//!
//! # Available Handlers
//!
//! - [`account`] - Registration and login
//! - [`token`] - Refresh and logout
//! - [`protected`] - Sample resource requiring an authenticated caller
//!
//! [`routes`] mounts all of them under `/auth`.

pub mod account;
pub mod extract;
pub mod protected;
pub mod token;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::AuthState;

pub use account::{SessionResponse, UserSummary, login_handler, register_handler};
pub use extract::JsonBody;
pub use protected::{ProtectedResponse, protected_handler};
pub use token::{RefreshRequest, RefreshResponse, logout_handler, refresh_handler};

/// Returns the auth routes, still expecting an [`AuthState`].
pub fn routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/protected", get(protected_handler))
}
