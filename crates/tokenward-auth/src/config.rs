//! Token lifecycle configuration.
//!
//! This module provides the configuration types for the auth module:
//! token signing, token lifetimes, and revocation store behavior.
//! Nothing security-relevant is hardcoded; the signing secret has no default
//! and validation fails until one is supplied.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::token::jwt::{SigningAlgorithm, SigningKey};

/// Longest accepted token lifetime (100 years).
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(100 * 365 * 86_400);

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://api.example.com"
///
/// [auth.signing]
/// algorithm = "HS256"
/// secret = "c2VjcmV0LXNlY3JldC1zZWNyZXQtc2VjcmV0LXNlY3JldA=="
/// secret_encoding = "base64"
///
/// [auth.tokens]
/// access_token_lifetime = "5m"
/// refresh_token_lifetime = "1d"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer claim value (`iss`) written into and required from every token.
    pub issuer: String,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Token lifetime configuration.
    pub tokens: TokenLifetimeConfig,

    /// Revocation store configuration.
    pub revocation: RevocationConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "tokenward".to_string(),
            signing: SigningConfig::default(),
            tokens: TokenLifetimeConfig::default(),
            revocation: RevocationConfig::default(),
        }
    }
}

/// Token signing configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "HS256", "HS384", "HS512"
    pub algorithm: String,

    /// Shared signing secret. Must be supplied externally.
    pub secret: String,

    /// How `secret` is encoded.
    pub secret_encoding: SecretEncoding,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret: String::new(),
            secret_encoding: SecretEncoding::Raw,
        }
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("algorithm", &self.algorithm)
            .field("secret", &"<redacted>")
            .field("secret_encoding", &self.secret_encoding)
            .finish()
    }
}

impl SigningConfig {
    /// Builds the signing key described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing, cannot be decoded,
    /// is too short, or the algorithm is unsupported.
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Missing("auth.signing.secret".to_string()));
        }

        let algorithm = SigningAlgorithm::from_str(&self.algorithm).map_err(|_| {
            ConfigError::InvalidValue(format!(
                "Invalid signing algorithm: '{}'. Must be HS256, HS384, or HS512",
                self.algorithm
            ))
        })?;

        let key = match self.secret_encoding {
            SecretEncoding::Raw => SigningKey::from_bytes(algorithm, self.secret.as_bytes()),
            SecretEncoding::Base64 => SigningKey::from_base64(algorithm, &self.secret),
        };

        key.map_err(|e| ConfigError::InvalidValue(format!("auth.signing.secret: {e}")))
    }
}

/// Encoding of the configured signing secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretEncoding {
    /// The secret string is used as-is (UTF-8 bytes).
    Raw,
    /// The secret string is standard base64.
    Base64,
}

/// Token lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenLifetimeConfig {
    /// Access token lifetime.
    /// This is also the worst-case revocation latency for a logged-out user.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,
}

impl Default for TokenLifetimeConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(5 * 60), // 5 minutes
            refresh_token_lifetime: Duration::from_secs(24 * 3600), // 1 day
        }
    }
}

/// Revocation store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Upper bound for a single revocation store call.
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,

    /// How often entries for naturally expired tokens are pruned.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(2),
            cleanup_interval: Duration::from_secs(600),
        }
    }
}

/// Errors that can occur while validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The issuer is empty
    /// - The signing secret is missing, undecodable, or too short
    /// - The signing algorithm is not supported
    /// - A lifetime is shorter than one second or longer than [`MAX_TOKEN_LIFETIME`]
    /// - The access token lifetime is not shorter than the refresh token lifetime
    /// - The store timeout or cleanup interval is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        self.signing.signing_key()?;

        let tokens = &self.tokens;
        if tokens.access_token_lifetime < Duration::from_secs(1) {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be at least 1s".to_string(),
            ));
        }
        if tokens.refresh_token_lifetime < Duration::from_secs(1) {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be at least 1s".to_string(),
            ));
        }
        if tokens.refresh_token_lifetime > MAX_TOKEN_LIFETIME {
            return Err(ConfigError::InvalidValue(format!(
                "refresh_token_lifetime must be at most {}s",
                MAX_TOKEN_LIFETIME.as_secs()
            )));
        }
        if tokens.access_token_lifetime >= tokens.refresh_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be shorter than refresh_token_lifetime".to_string(),
            ));
        }

        if self.revocation.store_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "revocation store_timeout must be > 0".to_string(),
            ));
        }
        if self.revocation.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "revocation cleanup_interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.signing.secret = "0123456789abcdef0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_default_config_requires_secret() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(err.to_string().contains("auth.signing.secret"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_issuer_fails_validation() {
        let mut config = valid_config();
        config.issuer = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_short_secret_fails_validation() {
        let mut config = valid_config();
        config.signing.secret = "too-short".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.signing.secret"));
    }

    #[test]
    fn test_invalid_algorithm_fails_validation() {
        let mut config = valid_config();
        config.signing.algorithm = "RS256".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("signing algorithm"));
    }

    #[test]
    fn test_base64_secret() {
        let mut config = valid_config();
        // 32 bytes of 'k'
        config.signing.secret = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=".to_string();
        config.signing.secret_encoding = SecretEncoding::Base64;
        assert!(config.validate().is_ok());

        config.signing.secret = "%%% not base64 %%%".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_lifetime_must_be_shorter_than_refresh() {
        let mut config = valid_config();
        config.tokens.access_token_lifetime = Duration::from_secs(3600);
        config.tokens.refresh_token_lifetime = Duration::from_secs(3600);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("shorter"));
    }

    #[test]
    fn test_unbounded_refresh_lifetime_fails_validation() {
        let mut config = valid_config();
        config.tokens.refresh_token_lifetime = Duration::from_secs(i64::MAX as u64);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_token_lifetime"));

        config.tokens.refresh_token_lifetime = MAX_TOKEN_LIFETIME;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_store_timeout_fails_validation() {
        let mut config = valid_config();
        config.revocation.store_timeout = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("store_timeout"));
    }

    #[test]
    fn test_default_lifetimes() {
        let tokens = TokenLifetimeConfig::default();
        assert_eq!(tokens.access_token_lifetime, Duration::from_secs(300));
        assert_eq!(tokens.refresh_token_lifetime, Duration::from_secs(86400));
    }

    #[test]
    fn test_humantime_deserialization() {
        let json = r#"{
            "issuer": "https://api.example.com",
            "signing": { "secret": "0123456789abcdef0123456789abcdef" },
            "tokens": { "access_token_lifetime": "15m", "refresh_token_lifetime": "7days" }
        }"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tokens.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(
            config.tokens.refresh_token_lifetime,
            Duration::from_secs(7 * 86400)
        );
        assert_eq!(config.signing.algorithm, "HS256");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signing_config_debug_redacts_secret() {
        let config = valid_config();
        let debug = format!("{:?}", config.signing);
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue("test error".to_string());
        assert_eq!(err.to_string(), "Invalid configuration value: test error");

        let err = ConfigError::Missing("required_field".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: required_field"
        );
    }
}
