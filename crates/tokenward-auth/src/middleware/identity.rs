//! Request-scoped identity resolution.
//!
//! Each request gets one [`RequestIdentity`]. The first call to
//! [`RequestIdentity::current`] resolves the caller; every later call, from
//! any component handling the same request, returns the cached result.
//!
//! Resolution order:
//!
//! 1. An identity already established on the request (for example by a
//!    session layer) is used as-is.
//! 2. Otherwise an `Authorization: Bearer <token>` header is verified as an
//!    access token. Token failures resolve to anonymous.
//! 3. Without credentials the caller is anonymous.
//!
//! Verification failures caused by infrastructure (the verifier could not
//! answer) are returned as errors and leave the request unresolved, so a
//! later call may retry.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::AuthResult;
use crate::error::AuthError;
use crate::token::TokenService;
use crate::types::UserIdentity;

/// Verifies access tokens on behalf of the resolver.
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    /// Returns the identity an access token was issued to.
    ///
    /// # Errors
    ///
    /// Token errors for rejected tokens; any other kind is treated as an
    /// infrastructure failure.
    async fn verify_access(&self, token: &str) -> AuthResult<UserIdentity>;
}

#[async_trait]
impl AccessTokenVerifier for TokenService {
    async fn verify_access(&self, token: &str) -> AuthResult<UserIdentity> {
        self.validate_access(token)
    }
}

// =============================================================================
// Resolved identity
// =============================================================================

/// Where an authenticated identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Established on the request before resolution.
    Session,
    /// Verified from a bearer access token.
    Bearer,
}

/// Why a request resolved to anonymous.
#[derive(Debug, Clone)]
pub enum AnonymousReason {
    /// No `Authorization` header was sent.
    NoCredentials,
    /// The `Authorization` header was not `Bearer <token>`.
    MalformedHeader,
    /// The bearer token was rejected.
    Rejected(AuthError),
}

/// Outcome of resolving the caller of a request.
#[derive(Debug, Clone)]
pub enum ResolvedIdentity {
    /// The caller is known.
    Authenticated {
        /// Caller identity.
        identity: UserIdentity,
        /// Credential source.
        source: IdentitySource,
    },
    /// The caller is anonymous.
    Anonymous {
        /// Internal cause, never shown to clients.
        reason: AnonymousReason,
    },
}

impl ResolvedIdentity {
    /// Returns the identity if the caller is authenticated.
    #[must_use]
    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Authenticated { identity, .. } => Some(identity),
            Self::Anonymous { .. } => None,
        }
    }

    /// Returns `true` if the caller is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Request extension carrying an identity established before resolution.
#[derive(Debug, Clone)]
pub struct EstablishedIdentity(pub UserIdentity);

// =============================================================================
// Credentials
// =============================================================================

/// Bearer credential extracted from an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum BearerCredential {
    /// No header.
    Missing,
    /// Header present but not `Bearer <token>`.
    Malformed,
    /// Token to verify.
    Token(String),
}

impl BearerCredential {
    /// Parses an `Authorization` header value.
    ///
    /// The value must be exactly two whitespace-separated parts with the
    /// case-sensitive scheme `Bearer`.
    #[must_use]
    pub fn parse(authorization: Option<&str>) -> Self {
        let Some(value) = authorization else {
            return Self::Missing;
        };

        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("Bearer"), Some(token), None) => Self::Token(token.to_string()),
            _ => Self::Malformed,
        }
    }
}

impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("Missing"),
            Self::Malformed => f.write_str("Malformed"),
            Self::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Creates per-request identity state.
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Arc<dyn AccessTokenVerifier>,
}

impl IdentityResolver {
    /// Creates a resolver backed by an access token verifier.
    #[must_use]
    pub fn new(verifier: Arc<dyn AccessTokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Creates the identity state for one request.
    ///
    /// # Arguments
    ///
    /// * `established` - Identity already attached to the request, if any
    /// * `authorization` - Raw `Authorization` header value, if any
    #[must_use]
    pub fn for_request(
        &self,
        established: Option<UserIdentity>,
        authorization: Option<&str>,
    ) -> RequestIdentity {
        self.with_credential(established, BearerCredential::parse(authorization))
    }

    /// Creates the identity state from an already parsed credential.
    #[must_use]
    pub fn with_credential(
        &self,
        established: Option<UserIdentity>,
        credential: BearerCredential,
    ) -> RequestIdentity {
        RequestIdentity {
            inner: Arc::new(RequestIdentityInner {
                verifier: self.verifier.clone(),
                established,
                credential,
                resolved: OnceCell::new(),
            }),
        }
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}

/// Memoized identity of one request.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct RequestIdentity {
    inner: Arc<RequestIdentityInner>,
}

struct RequestIdentityInner {
    verifier: Arc<dyn AccessTokenVerifier>,
    established: Option<UserIdentity>,
    credential: BearerCredential,
    resolved: OnceCell<ResolvedIdentity>,
}

impl RequestIdentity {
    /// Resolves the caller on first use and returns the cached result.
    ///
    /// Concurrent callers wait for a single resolution.
    ///
    /// # Errors
    ///
    /// Returns non-token verifier errors such as `StoreUnavailable`. The
    /// request stays unresolved in that case.
    pub async fn current(&self) -> AuthResult<&ResolvedIdentity> {
        self.inner
            .resolved
            .get_or_try_init(|| self.inner.resolve())
            .await
    }

    /// Returns the result if resolution already happened.
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedIdentity> {
        self.inner.resolved.get()
    }
}

impl RequestIdentityInner {
    async fn resolve(&self) -> AuthResult<ResolvedIdentity> {
        if let Some(identity) = &self.established {
            return Ok(ResolvedIdentity::Authenticated {
                identity: identity.clone(),
                source: IdentitySource::Session,
            });
        }

        let token = match &self.credential {
            BearerCredential::Missing => {
                return Ok(ResolvedIdentity::Anonymous {
                    reason: AnonymousReason::NoCredentials,
                });
            }
            BearerCredential::Malformed => {
                tracing::debug!("Malformed Authorization header, treating caller as anonymous");
                return Ok(ResolvedIdentity::Anonymous {
                    reason: AnonymousReason::MalformedHeader,
                });
            }
            BearerCredential::Token(token) => token,
        };

        match self.verifier.verify_access(token).await {
            Ok(identity) => {
                tracing::debug!(sub = %identity.id, "Bearer token accepted");
                Ok(ResolvedIdentity::Authenticated {
                    identity,
                    source: IdentitySource::Bearer,
                })
            }
            Err(e) if e.is_token_error() => {
                tracing::debug!(error = %e, "Bearer token rejected, treating caller as anonymous");
                Ok(ResolvedIdentity::Anonymous {
                    reason: AnonymousReason::Rejected(e),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Identity resolution failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestIdentity")
            .field("credential", &self.inner.credential)
            .field("resolved", &self.inner.resolved.get())
            .finish_non_exhaustive()
    }
}
