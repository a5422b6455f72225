//! Common types used across the token lifecycle modules.
//!
//! ## Domain Types
//!
//! - [`UserIdentity`] - Authenticated identity owned by the account store
//! - [`RevocationEntry`] - Record of an explicitly revoked refresh token

pub mod identity;
pub mod revocation_entry;

pub use identity::{UserId, UserIdentity};
pub use revocation_entry::RevocationEntry;
