//! User identity domain type.
//!
//! Identities are owned by the account store. The token subsystem only
//! carries them through claims and hands them back on validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps an identifier issued by the account store.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An authenticated user: identifier plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable identifier.
    pub id: UserId,

    /// Human-readable name (the username for accounts created here).
    pub display_name: String,
}

impl UserIdentity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_serializes_transparently() {
        let identity = UserIdentity::new("u-1", "alice");
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["id"], "u-1");
        assert_eq!(json["display_name"], "alice");
    }
}
