//! Storage for authentication data.
//!
//! This module defines storage interfaces for:
//!
//! - Revoked refresh token IDs
//! - User accounts
//!
//! Each trait comes with an in-memory implementation suitable for a single
//! server process.

pub mod account;
pub mod revocation;

pub use account::{AccountStore, Credentials, InMemoryAccountStore};
pub use revocation::{InMemoryRevocationStore, RevocationStore};
