//! Sample resource that requires an authenticated caller.

use axum::Json;
use serde::Serialize;

use crate::middleware::RequireIdentity;

use super::account::UserSummary;

/// Greeting for the resolved caller.
#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    /// Human-readable greeting naming the caller.
    pub message: String,
    /// Caller summary.
    pub user: UserSummary,
}

/// Answers only authenticated callers; anonymous callers get a 401.
pub async fn protected_handler(RequireIdentity(user): RequireIdentity) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: format!("Hello {}, you are authenticated!", user.display_name),
        user: UserSummary::from(&user),
    })
}
