//! Revocation record domain type.
//!
//! # Lifecycle
//!
//! - Created when a refresh token is revoked, never mutated afterwards
//! - Presence of an entry is what marks the token as revoked
//! - May be pruned once the token's own expiry has passed, because an
//!   expired token is rejected regardless of revocation state

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Record of an explicitly revoked refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationEntry {
    /// The `jti` of the revoked refresh token.
    pub token_id: Uuid,

    /// When the revocation was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub revoked_at: OffsetDateTime,

    /// When the revoked token would have expired naturally.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RevocationEntry {
    /// Creates an entry revoked now.
    #[must_use]
    pub fn new(token_id: Uuid, expires_at: OffsetDateTime) -> Self {
        Self {
            token_id,
            revoked_at: OffsetDateTime::now_utc(),
            expires_at,
        }
    }

    /// Returns `true` once the entry no longer needs to be kept.
    #[must_use]
    pub fn is_prunable_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_prunable_only_after_expiry() {
        let now = OffsetDateTime::now_utc();
        let entry = RevocationEntry::new(Uuid::new_v4(), now + Duration::hours(1));
        assert!(!entry.is_prunable_at(now));
        assert!(entry.is_prunable_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_serialization_uses_rfc3339() {
        let entry = RevocationEntry::new(Uuid::new_v4(), OffsetDateTime::UNIX_EPOCH);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["expiresAt"], "1970-01-01T00:00:00Z");
        assert!(json["tokenId"].is_string());
    }
}
