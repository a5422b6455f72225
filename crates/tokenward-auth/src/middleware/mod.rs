//! HTTP middleware for request identity.
//!
//! This module provides:
//!
//! - Lazy, once-per-request identity resolution
//! - Axum middleware and extractors on top of it
//! - JSON error responses with `WWW-Authenticate` challenges
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use tokenward_auth::middleware::{AuthState, RequireIdentity};
//!
//! async fn protected_handler(RequireIdentity(user): RequireIdentity) -> String {
//!     format!("Hello, {}!", user.display_name)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(AuthState::new(token_service, accounts));
//! ```

pub mod auth;
pub mod error;
pub mod identity;

pub use auth::{
    AuthState, CurrentIdentity, RequireIdentity, attach_request_identity, request_identity,
};
pub use error::{REALM, default_status, error_response};
pub use identity::{
    AccessTokenVerifier, AnonymousReason, BearerCredential, EstablishedIdentity, IdentityResolver,
    IdentitySource, RequestIdentity, ResolvedIdentity,
};
