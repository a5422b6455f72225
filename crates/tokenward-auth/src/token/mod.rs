//! Token generation, validation, and management.
//!
//! This module provides:
//!
//! - JWT encoding and decoding
//! - Access/refresh token issuance
//! - Refresh and revocation

pub mod jwt;
pub mod service;

pub use jwt::{
    JwtCodec, JwtError, SigningAlgorithm, SigningKey, TokenClaims, TokenClaimsBuilder, TokenType,
};
pub use service::{TokenConfig, TokenPair, TokenService};
