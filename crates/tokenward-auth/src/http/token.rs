//! Refresh and logout endpoint handlers.
//!
//! # Request Format
//!
//! ```text
//! POST /auth/refresh
//! POST /auth/logout
//! Content-Type: application/json
//!
//! {"refresh": "<refresh token>"}
//! ```
//!
//! Refresh answers `{"access": "..."}`; every refresh failure, including an
//! unreadable body, is `401 Unauthorized`. Logout revokes the refresh token and
//! answers `205 Reset Content` with an empty body; a token that cannot be
//! revoked is reported as `400 Bad Request`.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::middleware::{AuthState, error_response};

use super::extract::JsonBody;

/// Body carrying a refresh token.
#[derive(Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh: String,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest").finish_non_exhaustive()
    }
}

/// New access token.
#[derive(Serialize)]
pub struct RefreshResponse {
    /// The access token.
    pub access: String,
}

/// Issues a new access token for a valid, unrevoked refresh token.
///
/// # Errors
///
/// Token failures and a missing or unreadable body are 401 with the specific
/// error code; a store outage is 503.
pub async fn refresh_handler(
    State(state): State<AuthState>,
    body: Result<JsonBody<RefreshRequest>, AuthError>,
) -> Response {
    let request = match body {
        Ok(JsonBody(request)) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Refresh rejected");
            return error_response(&e, StatusCode::UNAUTHORIZED);
        }
    };

    match state.token_service.refresh(&request.refresh).await {
        Ok(access) => Json(RefreshResponse { access }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Revokes a refresh token.
///
/// Revoking an already revoked token succeeds.
pub async fn logout_handler(
    State(state): State<AuthState>,
    body: Result<JsonBody<RefreshRequest>, AuthError>,
) -> Response {
    let result = match body {
        Ok(JsonBody(request)) => state.token_service.revoke(&request.refresh).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => StatusCode::RESET_CONTENT.into_response(),
        Err(e) if e.is_server_error() => e.into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Logout rejected");
            error_response(&e, StatusCode::BAD_REQUEST)
        }
    }
}
