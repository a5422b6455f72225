//! JWT token encoding and decoding.
//!
//! This module is the token codec: a pure function of the claims and a fixed
//! HMAC signing key. It supports HS256, HS384, and HS512.
//!
//! ## Decode order
//!
//! 1. Structure (three base64url parts, JSON header and claims)
//! 2. Signature, including a header algorithm matching the configured one
//! 3. Issuer
//! 4. Claim sanity (`iat < exp`)
//! 5. Expiry (`now >= exp` is expired, no leeway)
//! 6. Token type expected by the caller
//!
//! ## Example
//!
//! ```ignore
//! use tokenward_auth::token::jwt::{JwtCodec, SigningAlgorithm, SigningKey, TokenType};
//!
//! let key = SigningKey::generate(SigningAlgorithm::HS256);
//! let codec = JwtCodec::new(key, "https://api.example.com");
//!
//! let token = codec.encode(&claims)?;
//! let claims = codec.decode(&token, TokenType::Access)?;
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::AuthError;
use crate::types::{UserId, UserIdentity};

/// Minimum accepted HMAC secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is structurally invalid.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of what could not be parsed.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token is valid but of the wrong type for this context.
    #[error("Expected {expected} token, found {found}")]
    WrongTokenType {
        /// Token type required by the caller.
        expected: TokenType,
        /// Token type carried by the token.
        found: TokenType,
    },

    /// The token lifetime cannot be represented.
    #[error("Invalid token lifetime: {message}")]
    InvalidLifetime {
        /// Description of the out-of-range lifetime.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidLifetime` error.
    #[must_use]
    pub fn invalid_lifetime(message: impl Into<String>) -> Self {
        Self::InvalidLifetime {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error (the token was rejected).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. }
                | Self::Expired
                | Self::InvalidSignature
                | Self::WrongTokenType { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::malformed(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Malformed { message } => AuthError::malformed_token(message),
            JwtError::InvalidSignature => AuthError::SignatureInvalid,
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::WrongTokenType { expected, found } => {
                AuthError::WrongTokenType { expected, found }
            }
            JwtError::EncodingError { message } => AuthError::internal(message),
            JwtError::InvalidKey { message } | JwtError::InvalidLifetime { message } => {
                AuthError::configuration(message)
            }
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms for JWT tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(JwtError::invalid_key(format!(
                "unsupported signing algorithm '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Token type carried in the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token authorizing individual requests.
    Access,
    /// Long-lived token exchanged for new access tokens.
    Refresh,
}

impl TokenType {
    /// Returns the claim value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every token.
///
/// Immutable once built; timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject (user ID).
    pub sub: String,

    /// Subject display name.
    pub name: String,

    /// Token type.
    pub typ: TokenType,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Token ID, used as the revocation key for refresh tokens.
    pub jti: Uuid,
}

impl TokenClaims {
    /// Creates a new builder for token claims.
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        identity: &UserIdentity,
        token_type: TokenType,
    ) -> TokenClaimsBuilder {
        TokenClaimsBuilder::new(issuer, identity, token_type)
    }

    /// Returns the identity this token was issued to.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: UserId::new(self.sub.clone()),
            display_name: self.name.clone(),
        }
    }

    /// Returns the expiration time.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// Returns `true` if the token is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() >= self.exp
    }
}

/// Builder for `TokenClaims`.
pub struct TokenClaimsBuilder {
    iss: String,
    sub: String,
    name: String,
    typ: TokenType,
    iat: i64,
    lifetime: Duration,
}

impl TokenClaimsBuilder {
    fn new(issuer: impl Into<String>, identity: &UserIdentity, token_type: TokenType) -> Self {
        Self {
            iss: issuer.into(),
            sub: identity.id.to_string(),
            name: identity.display_name.clone(),
            typ: token_type,
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            lifetime: Duration::minutes(5),
        }
    }

    /// Sets the issue time.
    #[must_use]
    pub fn issued_at(mut self, at: OffsetDateTime) -> Self {
        self.iat = at.unix_timestamp();
        self
    }

    /// Sets the lifetime relative to the issue time.
    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Builds the token claims with a fresh token ID.
    ///
    /// # Errors
    /// Returns `InvalidLifetime` if the expiry does not fit a Unix timestamp.
    pub fn build(self) -> Result<TokenClaims, JwtError> {
        let exp = self
            .iat
            .checked_add(self.lifetime.whole_seconds())
            .filter(|exp| OffsetDateTime::from_unix_timestamp(*exp).is_ok())
            .ok_or_else(|| {
                JwtError::invalid_lifetime(format!(
                    "{}s lifetime overflows the expiry time",
                    self.lifetime.whole_seconds()
                ))
            })?;

        Ok(TokenClaims {
            iss: self.iss,
            sub: self.sub,
            name: self.name,
            typ: self.typ,
            iat: self.iat,
            exp,
            jti: Uuid::new_v4(),
        })
    }
}

// ============================================================================
// Signing Key
// ============================================================================

/// A symmetric signing key for JWT operations.
pub struct SigningKey {
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key for signing.
    encoding_key: EncodingKey,

    /// Decoding key for verification.
    decoding_key: DecodingKey,
}

impl SigningKey {
    /// Creates a key from raw secret bytes.
    ///
    /// # Errors
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn from_bytes(algorithm: SigningAlgorithm, secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::invalid_key(format!(
                "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Creates a key from a standard base64-encoded secret.
    ///
    /// # Errors
    /// Returns an error if the input is not valid base64 or is too short.
    pub fn from_base64(algorithm: SigningAlgorithm, secret: &str) -> Result<Self, JwtError> {
        let bytes = STANDARD
            .decode(secret.trim())
            .map_err(|e| JwtError::invalid_key(format!("invalid base64: {e}")))?;
        Self::from_bytes(algorithm, &bytes)
    }

    /// Generates a random 64-byte key.
    #[must_use]
    pub fn generate(algorithm: SigningAlgorithm) -> Self {
        let mut secret = [0u8; 64];
        OsRng.fill_bytes(&mut secret);
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// JWT Codec
// ============================================================================

/// Stateless codec for signed tokens.
///
/// This codec is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
#[derive(Debug)]
pub struct JwtCodec {
    signing_key: SigningKey,
    issuer: String,
}

impl JwtCodec {
    /// Creates a new codec.
    ///
    /// # Arguments
    /// * `signing_key` - The key used for signing and verification
    /// * `issuer` - The issuer claim value
    #[must_use]
    pub fn new(signing_key: SigningKey, issuer: impl Into<String>) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
        }
    }

    /// Encodes claims into a signed token. Identical claims and key yield
    /// identical output.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, JwtError> {
        let header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a token that must be of type `expected`.
    ///
    /// # Errors
    /// Returns `Malformed`, `InvalidSignature`, `Expired`, or `WrongTokenType`.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<TokenClaims, JwtError> {
        self.decode_at(token, expected, OffsetDateTime::now_utc())
    }

    /// Decodes and validates a token against an explicit current time.
    ///
    /// # Errors
    /// Returns `Malformed`, `InvalidSignature`, `Expired`, or `WrongTokenType`.
    pub fn decode_at(
        &self,
        token: &str,
        expected: TokenType,
        now: OffsetDateTime,
    ) -> Result<TokenClaims, JwtError> {
        let claims = decode::<TokenClaims>(token, &self.signing_key.decoding_key, &self.validation())
            .map_err(JwtError::from)?
            .claims;

        if claims.iat >= claims.exp {
            return Err(JwtError::malformed("iat must precede exp"));
        }

        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        if claims.typ != expected {
            return Err(JwtError::WrongTokenType {
                expected,
                found: claims.typ,
            });
        }

        Ok(claims)
    }

    /// Returns the issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);
        // Expiry is checked after decoding so that `now == exp` is already expired.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }
}

// ============================================================================
// Tests
// ============================================================================
