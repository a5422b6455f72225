//! Axum integration for request identity.
//!
//! [`attach_request_identity`] stores one shared [`RequestIdentity`] in the
//! request extensions. The extractors read it, or create and store it when
//! the middleware is not installed, so identity is resolved at most once per
//! request either way.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use tokenward_auth::middleware::{RequireIdentity, attach_request_identity};
//!
//! async fn protected_handler(RequireIdentity(user): RequireIdentity) -> String {
//!     format!("Hello, {}!", user.display_name)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(middleware::from_fn_with_state(auth_state.clone(), attach_request_identity))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::storage::AccountStore;
use crate::token::TokenService;
use crate::types::UserIdentity;

use super::identity::{
    BearerCredential, EstablishedIdentity, IdentityResolver, RequestIdentity, ResolvedIdentity,
};

// =============================================================================
// Auth State
// =============================================================================

/// Shared state for the auth endpoints and extractors.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
///     // ... other state
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    /// Token lifecycle service.
    pub token_service: Arc<TokenService>,

    /// Account collaborator for login and registration.
    pub accounts: Arc<dyn AccountStore>,

    /// Per-request identity resolver.
    pub resolver: IdentityResolver,
}

impl AuthState {
    /// Creates a new auth state. The resolver verifies bearer tokens with
    /// `token_service`.
    pub fn new(token_service: Arc<TokenService>, accounts: Arc<dyn AccountStore>) -> Self {
        let resolver = IdentityResolver::new(token_service.clone());
        Self {
            token_service,
            accounts,
            resolver,
        }
    }
}

impl FromRef<AuthState> for IdentityResolver {
    fn from_ref(state: &AuthState) -> Self {
        state.resolver.clone()
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Attaches a lazily resolved [`RequestIdentity`] to every request.
///
/// An [`EstablishedIdentity`] extension set by an outer layer takes priority
/// over the `Authorization` header.
pub async fn attach_request_identity(
    State(resolver): State<IdentityResolver>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    request_identity(&mut parts, &resolver);
    next.run(Request::from_parts(parts, body)).await
}

/// Returns the request's identity state, creating and storing it if absent.
pub fn request_identity(parts: &mut Parts, resolver: &IdentityResolver) -> RequestIdentity {
    if let Some(existing) = parts.extensions.get::<RequestIdentity>() {
        return existing.clone();
    }

    let established = parts
        .extensions
        .get::<EstablishedIdentity>()
        .map(|e| e.0.clone());
    let credential = match parts.headers.get(AUTHORIZATION) {
        None => BearerCredential::Missing,
        Some(value) => match value.to_str() {
            Ok(value) => BearerCredential::parse(Some(value)),
            Err(_) => BearerCredential::Malformed,
        },
    };

    let identity = resolver.with_credential(established, credential);
    parts.extensions.insert(identity.clone());
    identity
}

// =============================================================================
// Extractors
// =============================================================================

/// Extracts the resolved caller, authenticated or anonymous.
///
/// Token failures never reject; only infrastructure failures do (503/500).
///
/// # Example
///
/// ```ignore
/// async fn handler(CurrentIdentity(caller): CurrentIdentity) -> String {
///     match caller.identity() {
///         Some(user) => format!("Hello, {}!", user.display_name),
///         None => "Hello, stranger!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub ResolvedIdentity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
    IdentityResolver: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resolver = IdentityResolver::from_ref(state);
        let identity = request_identity(parts, &resolver);
        let resolved = identity.current().await?;
        Ok(Self(resolved.clone()))
    }
}

/// Extracts the authenticated caller or rejects with a uniform 401.
#[derive(Debug, Clone)]
pub struct RequireIdentity(pub UserIdentity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
    IdentityResolver: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(resolved) = CurrentIdentity::from_request_parts(parts, state).await?;
        match resolved {
            ResolvedIdentity::Authenticated { identity, .. } => Ok(Self(identity)),
            ResolvedIdentity::Anonymous { .. } => Err(AuthError::unauthorized(
                "Authentication credentials were not provided or are invalid.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{StatusCode, header},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::AuthResult;
    use crate::middleware::identity::AccessTokenVerifier;

    struct CountingVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccessTokenVerifier for CountingVerifier {
        async fn verify_access(&self, token: &str) -> AuthResult<UserIdentity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token == "good" {
                Ok(UserIdentity::new("user-1", "alice"))
            } else {
                Err(AuthError::malformed_token("not a token"))
            }
        }
    }

    async fn both(
        CurrentIdentity(first): CurrentIdentity,
        RequireIdentity(user): RequireIdentity,
    ) -> String {
        assert!(first.is_authenticated());
        user.display_name
    }

    async fn required(RequireIdentity(user): RequireIdentity) -> String {
        user.display_name
    }

    async fn optional(CurrentIdentity(caller): CurrentIdentity) -> String {
        caller
            .identity()
            .map_or_else(|| "anonymous".to_string(), |u| u.display_name.clone())
    }

    fn app(verifier: Arc<CountingVerifier>, with_middleware: bool) -> Router {
        let resolver = IdentityResolver::new(verifier);
        let router = Router::new()
            .route("/both", get(both))
            .route("/required", get(required))
            .route("/optional", get(optional));
        let router = if with_middleware {
            router.layer(from_fn_with_state(resolver.clone(), attach_request_identity))
        } else {
            router
        };
        router.with_state(resolver)
    }

    fn verifier() -> Arc<CountingVerifier> {
        Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
        })
    }

    async fn get_with(app: Router, uri: &str, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_two_extractors_verify_once_with_middleware() {
        let verifier = verifier();
        let (status, body) =
            get_with(app(verifier.clone(), true), "/both", Some("Bearer good")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_two_extractors_verify_once_without_middleware() {
        let verifier = verifier();
        let (status, _) =
            get_with(app(verifier.clone(), false), "/both", Some("Bearer good")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_required_identity_rejects_anonymous() {
        let (status, _) = get_with(app(verifier(), true), "/required", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = get_with(app(verifier(), true), "/required", Some("Bearer bad")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_uniform_rejection_body() {
        let (_, missing) = get_with(app(verifier(), true), "/required", None).await;
        let (_, bad) = get_with(app(verifier(), true), "/required", Some("Bearer bad")).await;
        let (_, malformed) = get_with(app(verifier(), true), "/required", Some("Token x")).await;

        assert_eq!(missing, bad);
        assert_eq!(bad, malformed);
    }

    #[tokio::test]
    async fn test_optional_identity_never_rejects() {
        let (status, body) = get_with(app(verifier(), true), "/optional", Some("Bearer bad")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (_, body) = get_with(app(verifier(), true), "/optional", Some("Bearer good")).await;
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn test_established_identity_extension_is_used() {
        let verifier = verifier();
        let app = app(verifier.clone(), false).layer(axum::middleware::from_fn(
            |mut request: Request, next: Next| async move {
                request
                    .extensions_mut()
                    .insert(EstablishedIdentity(UserIdentity::new("user-9", "session-user")));
                next.run(request).await
            },
        ));

        let (status, body) = get_with(app, "/required", Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "session-user");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }
}
