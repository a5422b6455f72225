//! # tokenward-auth
//!
//! Session token lifecycle for the Tokenward server.
//!
//! This crate provides:
//! - Signed access/refresh token issuance and validation
//! - Refresh token revocation with pluggable storage
//! - Lazy, once-per-request caller identity resolution
//! - Axum middleware, extractors, and endpoint handlers
//!
//! ## Modules
//!
//! - [`config`] - Signing, lifetime, and revocation configuration
//! - [`token`] - Token codec and token service
//! - [`storage`] - Revocation and account storage traits
//! - [`middleware`] - Identity resolution and HTTP integration
//! - [`http`] - Axum HTTP handlers for the auth endpoints
//! - [`password`] - Argon2 password hashing

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod password;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use middleware::{
    AccessTokenVerifier, AnonymousReason, AuthState, CurrentIdentity, EstablishedIdentity,
    IdentityResolver, IdentitySource, RequestIdentity, RequireIdentity, ResolvedIdentity,
    attach_request_identity,
};
pub use storage::{
    AccountStore, Credentials, InMemoryAccountStore, InMemoryRevocationStore, RevocationStore,
};
pub use token::{JwtCodec, SigningAlgorithm, SigningKey, TokenConfig, TokenPair, TokenService, TokenType};
pub use types::{RevocationEntry, UserId, UserIdentity};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tokenward_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::middleware::{
        AuthState, CurrentIdentity, EstablishedIdentity, IdentityResolver, RequireIdentity,
        ResolvedIdentity,
    };
    pub use crate::storage::{AccountStore, InMemoryAccountStore, InMemoryRevocationStore, RevocationStore};
    pub use crate::token::{TokenPair, TokenService, TokenType};
    pub use crate::types::{UserId, UserIdentity};
}
