//! Token service for issuing, validating, refreshing, and revoking tokens.
//!
//! # Usage
//!
//! ```ignore
//! use tokenward_auth::token::{TokenConfig, TokenService};
//!
//! let service = TokenService::new(codec, revocation_store, TokenConfig::default());
//!
//! let pair = service.issue(&identity)?;
//! let identity = service.validate_access(&pair.access_token)?;
//! let access = service.refresh(&pair.refresh_token).await?;
//! service.revoke(&pair.refresh_token).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::storage::RevocationStore;
use crate::token::jwt::{JwtCodec, TokenClaims, TokenType};
use crate::types::UserIdentity;

/// Configuration for the token service.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Access token lifetime.
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    pub refresh_token_lifetime: Duration,

    /// Upper bound for a single revocation store call.
    pub store_timeout: std::time::Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::minutes(5),
            refresh_token_lifetime: Duration::days(1),
            store_timeout: std::time::Duration::from_secs(2),
        }
    }
}

impl TokenConfig {
    /// Builds the service configuration from the auth configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a lifetime does not fit a signed duration.
    pub fn from_auth_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let convert = |name: &str, value: std::time::Duration| {
            Duration::try_from(value)
                .map_err(|_| ConfigError::InvalidValue(format!("{name} is out of range")))
        };

        Ok(Self {
            access_token_lifetime: convert(
                "access_token_lifetime",
                config.tokens.access_token_lifetime,
            )?,
            refresh_token_lifetime: convert(
                "refresh_token_lifetime",
                config.tokens.refresh_token_lifetime,
            )?,
            store_timeout: config.revocation.store_timeout,
        })
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime;
        self
    }

    /// Sets the revocation store timeout.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

/// Access and refresh token issued together.
#[derive(Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived access token.
    #[serde(rename = "access")]
    pub access_token: String,

    /// Long-lived refresh token.
    #[serde(rename = "refresh")]
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Token service for the session token lifecycle.
///
/// Cheap to share behind an `Arc`; the only mutable state lives in the
/// revocation store.
pub struct TokenService {
    /// Codec for encoding/decoding tokens.
    codec: Arc<JwtCodec>,

    /// Revoked refresh token IDs.
    revocation_store: Arc<dyn RevocationStore>,

    /// Service configuration.
    config: TokenConfig,
}

impl TokenService {
    /// Creates a new token service.
    ///
    /// # Arguments
    ///
    /// * `codec` - Codec for token encoding/decoding
    /// * `revocation_store` - Storage for revoked refresh token IDs
    /// * `config` - Service configuration
    #[must_use]
    pub fn new(
        codec: Arc<JwtCodec>,
        revocation_store: Arc<dyn RevocationStore>,
        config: TokenConfig,
    ) -> Self {
        Self {
            codec,
            revocation_store,
            config,
        }
    }

    /// Builds a service from validated auth configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the signing key or lifetimes are invalid.
    pub fn from_config(
        config: &AuthConfig,
        revocation_store: Arc<dyn RevocationStore>,
    ) -> Result<Self, ConfigError> {
        let key = config.signing.signing_key()?;
        let codec = Arc::new(JwtCodec::new(key, config.issuer.clone()));
        Ok(Self::new(
            codec,
            revocation_store,
            TokenConfig::from_auth_config(config)?,
        ))
    }

    /// Issues a new access/refresh token pair for an identity.
    ///
    /// Both tokens share the same issue time and get fresh token IDs.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if encoding fails, or `Configuration` if a lifetime
    /// pushes the expiry out of range. No partial pair is ever returned.
    pub fn issue(&self, identity: &UserIdentity) -> AuthResult<TokenPair> {
        let now = OffsetDateTime::now_utc();

        let access = self.claims(identity, TokenType::Access, now)?;
        let refresh = self.claims(identity, TokenType::Refresh, now)?;

        let pair = TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
        };

        tracing::debug!(
            sub = %identity.id,
            access_jti = %access.jti,
            refresh_jti = %refresh.jti,
            "Issued token pair"
        );
        Ok(pair)
    }

    /// Validates an access token and returns the identity it was issued to.
    ///
    /// Revocation is not consulted; access tokens expire on their own.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken`, `SignatureInvalid`, `TokenExpired`, or
    /// `WrongTokenType`.
    pub fn validate_access(&self, token: &str) -> AuthResult<UserIdentity> {
        let claims = self.codec.decode(token, TokenType::Access)?;
        Ok(claims.identity())
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The refresh token is not rotated and stays usable until it expires or
    /// is revoked.
    ///
    /// # Errors
    ///
    /// Returns the codec error kinds, `TokenRevoked` if the token was revoked,
    /// or `StoreUnavailable` if the revocation store cannot answer in time.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = self.codec.decode(refresh_token, TokenType::Refresh)?;

        let revoked = self
            .with_timeout("is_revoked", self.revocation_store.is_revoked(claims.jti))
            .await?;
        if revoked {
            tracing::debug!(jti = %claims.jti, sub = %claims.sub, "Refresh with revoked token");
            return Err(AuthError::TokenRevoked);
        }

        let access = self.claims(
            &claims.identity(),
            TokenType::Access,
            OffsetDateTime::now_utc(),
        )?;
        let token = self.codec.encode(&access)?;

        tracing::debug!(jti = %claims.jti, access_jti = %access.jti, "Refreshed access token");
        Ok(token)
    }

    /// Revokes a refresh token. Revoking twice succeeds.
    ///
    /// # Errors
    ///
    /// Returns the codec error kinds for a token that cannot be decoded as a
    /// refresh token, or `StoreUnavailable`.
    pub async fn revoke(&self, refresh_token: &str) -> AuthResult<()> {
        let claims = self.codec.decode(refresh_token, TokenType::Refresh)?;

        self.with_timeout(
            "revoke",
            self.revocation_store
                .revoke(claims.jti, claims.expires_at()),
        )
        .await?;

        tracing::debug!(jti = %claims.jti, sub = %claims.sub, "Revoked refresh token");
        Ok(())
    }

    /// Prunes revocation entries for tokens that have expired.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store cannot answer in time.
    pub async fn cleanup_revocations(&self) -> AuthResult<u64> {
        self.with_timeout("cleanup_expired", self.revocation_store.cleanup_expired())
            .await
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> &Arc<JwtCodec> {
        &self.codec
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    fn claims(
        &self,
        identity: &UserIdentity,
        typ: TokenType,
        now: OffsetDateTime,
    ) -> AuthResult<TokenClaims> {
        let lifetime = match typ {
            TokenType::Access => self.config.access_token_lifetime,
            TokenType::Refresh => self.config.refresh_token_lifetime,
        };
        TokenClaims::builder(self.codec.issuer(), identity, typ)
            .issued_at(now)
            .lifetime(lifetime)
            .build()
            .map_err(AuthError::from)
    }

    async fn with_timeout<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = AuthResult<T>>,
    ) -> AuthResult<T> {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "Revocation store call timed out"
                );
                Err(AuthError::store_unavailable(format!(
                    "{operation} timed out after {:?}",
                    self.config.store_timeout
                )))
            }
        }
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
