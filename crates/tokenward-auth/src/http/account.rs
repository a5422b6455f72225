//! Registration and login endpoint handlers.
//!
//! # Request Format
//!
//! ```text
//! POST /auth/register
//! POST /auth/login
//! Content-Type: application/json
//!
//! {"username": "alice", "password": "s3cret"}
//! ```
//!
//! # Response
//!
//! Both return `{refresh, access, user: {id, username}}`; register with
//! `201 Created`, login with `200 OK`.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::AuthResult;
use crate::middleware::AuthState;
use crate::storage::Credentials;
use crate::token::TokenPair;
use crate::types::UserIdentity;

use super::extract::JsonBody;

/// Public summary of an account.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    /// User ID.
    pub id: String,
    /// Username.
    pub username: String,
}

impl From<&UserIdentity> for UserSummary {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.display_name.clone(),
        }
    }
}

/// Token pair plus the account it was issued for.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Issued tokens, flattened into `refresh` and `access`.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// Account summary.
    pub user: UserSummary,
}

/// Creates an account and signs it in.
///
/// # Errors
///
/// Returns `InvalidRequest` (400) for invalid or duplicate usernames.
pub async fn register_handler(
    State(state): State<AuthState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> AuthResult<(StatusCode, Json<SessionResponse>)> {
    let identity = state.accounts.register(&credentials).await?;
    let tokens = state.token_service.issue(&identity)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            tokens,
            user: UserSummary::from(&identity),
        }),
    ))
}

/// Exchanges credentials for a token pair.
///
/// # Errors
///
/// Returns `AccountInvalid` (401) for unknown users or wrong passwords.
pub async fn login_handler(
    State(state): State<AuthState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> AuthResult<Json<SessionResponse>> {
    let identity = state.accounts.verify(&credentials).await?;
    let tokens = state.token_service.issue(&identity)?;

    tracing::info!(user_id = %identity.id, "Login succeeded");
    Ok(Json(SessionResponse {
        tokens,
        user: UserSummary::from(&identity),
    }))
}
