//! Error response handling for authentication middleware.
//!
//! This module implements `IntoResponse` for `AuthError`. Bodies have the
//! form `{"error": <code>, "error_description": <message>}`.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// Realm advertised in `WWW-Authenticate` challenges.
pub const REALM: &str = "tokenward";

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = default_status(&self);
        error_response(&self, status)
    }
}

/// Default HTTP status for an error.
///
/// Token failures map to 401. Endpoints that treat a bad token as bad input
/// (logout) pick their own status through [`error_response`].
#[must_use]
pub fn default_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::MalformedToken { .. }
        | AuthError::SignatureInvalid
        | AuthError::TokenExpired
        | AuthError::TokenRevoked
        | AuthError::WrongTokenType { .. }
        | AuthError::AccountInvalid { .. }
        | AuthError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AuthError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        AuthError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Builds the JSON error response for `error` with an explicit status.
#[must_use]
pub fn error_response(error: &AuthError, status: StatusCode) -> Response {
    let code = error.error_code();
    let message = if error.is_server_error() {
        tracing::error!(error = %error, category = %error.category(), "Request failed");
        match error {
            AuthError::StoreUnavailable { .. } => "Service temporarily unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    } else {
        error.to_string()
    };

    let body = json!({
        "error": code,
        "error_description": message,
    });

    let mut headers = HeaderMap::new();
    if status == StatusCode::UNAUTHORIZED {
        let www_auth = build_www_authenticate_header(code, &message);
        if let Ok(value) = HeaderValue::from_str(&www_auth) {
            headers.insert(header::WWW_AUTHENTICATE, value);
        }
    }

    (status, headers, Json(body)).into_response()
}

/// Builds the WWW-Authenticate header value for 401 responses.
///
/// Format: `Bearer realm="tokenward", error="...", error_description="..."`
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped_desc = description.replace('\"', "\\\"");
    format!("Bearer realm=\"{REALM}\", error=\"{error}\", error_description=\"{escaped_desc}\"")
}

// =============================================================================
// Tests
// =============================================================================
