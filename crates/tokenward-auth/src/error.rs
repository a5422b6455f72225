//! Authentication error types.
//!
//! This module defines all error types that can occur while issuing,
//! validating, refreshing, and revoking session tokens.

use std::fmt;

use crate::token::jwt::TokenType;

/// Errors that can occur during token and identity operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The token is structurally invalid and cannot be parsed.
    #[error("Malformed token: {message}")]
    MalformedToken {
        /// Description of why the token could not be parsed.
        message: String,
    },

    /// The token signature does not verify against the signing key.
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The refresh token has been explicitly revoked.
    #[error("Token revoked")]
    TokenRevoked,

    /// The token is of a different type than the caller requires.
    #[error("Wrong token type: expected {expected}, found {found}")]
    WrongTokenType {
        /// Token type required by the calling context.
        expected: TokenType,
        /// Token type carried by the token.
        found: TokenType,
    },

    /// The revocation store could not be reached in time.
    #[error("Revocation store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure.
        message: String,
    },

    /// The account collaborator rejected the credentials.
    #[error("Invalid account: {message}")]
    AccountInvalid {
        /// Description of why the account was rejected.
        message: String,
    },

    /// The request is invalid or malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MalformedToken` error.
    #[must_use]
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    /// Creates a new `StoreUnavailable` error.
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `AccountInvalid` error.
    #[must_use]
    pub fn account_invalid(message: impl Into<String>) -> Self {
        Self::AccountInvalid {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the error describes a token that cannot be accepted.
    ///
    /// These are the failures the identity resolver downgrades to an
    /// anonymous caller.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::SignatureInvalid
                | Self::TokenExpired
                | Self::TokenRevoked
                | Self::WrongTokenType { .. }
        )
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.is_token_error()
            || matches!(
                self,
                Self::AccountInvalid { .. }
                    | Self::InvalidRequest { .. }
                    | Self::Unauthorized { .. }
            )
    }

    /// Returns `true` if this is a server or dependency error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedToken { .. }
            | Self::SignatureInvalid
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::WrongTokenType { .. } => ErrorCategory::Token,
            Self::AccountInvalid { .. } | Self::Unauthorized { .. } => {
                ErrorCategory::Authentication
            }
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::StoreUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns a stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedToken { .. } => "malformed_token",
            Self::SignatureInvalid => "signature_invalid",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::WrongTokenType { .. } => "wrong_token_type",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::AccountInvalid { .. } => "invalid_credentials",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Unauthorized { .. } => "not_authenticated",
            Self::Configuration { .. } => "server_error",
            Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token validation errors (structure, signature, expiry, revocation).
    Token,
    /// Authentication-related errors (credentials, missing identity).
    Authentication,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Authentication => write!(f, "authentication"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::malformed_token("not a jwt");
        assert_eq!(err.to_string(), "Malformed token: not a jwt");

        let err = AuthError::TokenExpired;
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::WrongTokenType {
            expected: TokenType::Refresh,
            found: TokenType::Access,
        };
        assert_eq!(
            err.to_string(),
            "Wrong token type: expected refresh, found access"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::SignatureInvalid.is_token_error());
        assert!(AuthError::TokenRevoked.is_token_error());
        assert!(AuthError::TokenRevoked.is_client_error());
        assert!(!AuthError::TokenRevoked.is_server_error());

        let err = AuthError::store_unavailable("timeout");
        assert!(!err.is_token_error());
        assert!(!err.is_client_error());
        assert!(err.is_server_error());

        let err = AuthError::account_invalid("bad password");
        assert!(!err.is_token_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(AuthError::TokenExpired.category(), ErrorCategory::Token);
        assert_eq!(
            AuthError::account_invalid("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::store_unavailable("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            AuthError::invalid_request("x").category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_error_codes_are_distinct_for_token_failures() {
        let codes = [
            AuthError::malformed_token("x").error_code(),
            AuthError::SignatureInvalid.error_code(),
            AuthError::TokenExpired.error_code(),
            AuthError::TokenRevoked.error_code(),
            AuthError::WrongTokenType {
                expected: TokenType::Access,
                found: TokenType::Refresh,
            }
            .error_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Token.to_string(), "token");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
