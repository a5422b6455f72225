//! Revoked refresh token storage.
//!
//! This module defines the storage interface for tracking revoked refresh
//! token IDs, plus an in-memory implementation backed by `DashMap`.
//!
//! # Guarantees
//!
//! - A `revoke` that returned `Ok` is visible to every later `is_revoked`
//!   call for the same ID
//! - Revoking an already-revoked ID succeeds and keeps the original entry
//! - Entries are only pruned once the token they describe has expired

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::RevocationEntry;

/// Storage trait for revoked refresh token IDs.
///
/// Only the `jti` of a refresh token is tracked. Access tokens are never
/// revoked individually; their short lifetime bounds how long a logged-out
/// session can still make requests.
///
/// # Example Implementation
///
/// ```ignore
/// use tokenward_auth::storage::RevocationStore;
/// use tokenward_auth::AuthResult;
///
/// struct RedisRevocationStore { /* ... */ }
///
/// #[async_trait::async_trait]
/// impl RevocationStore for RedisRevocationStore {
///     async fn revoke(&self, token_id: Uuid, expires_at: OffsetDateTime) -> AuthResult<()> {
///         // SET revoked:{token_id} 1 EXAT {expires_at}
///         Ok(())
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks a refresh token ID as revoked.
    ///
    /// `expires_at` is the token's own expiration time; the entry may be
    /// pruned after it.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the backend cannot be reached.
    async fn revoke(&self, token_id: Uuid, expires_at: OffsetDateTime) -> AuthResult<()>;

    /// Checks if a refresh token ID has been revoked.
    ///
    /// Called on every refresh, so implementations should keep it fast.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the backend cannot be reached.
    async fn is_revoked(&self, token_id: Uuid) -> AuthResult<bool>;

    /// Deletes entries for tokens that have expired naturally.
    ///
    /// Returns the number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self) -> AuthResult<u64>;

    /// Returns the number of entries currently held.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn len(&self) -> AuthResult<usize>;
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// Process-local revocation store.
///
/// Entries live as long as the process. Multiple server instances need a
/// shared backend instead.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: DashMap<Uuid, RevocationEntry>,
}

impl InMemoryRevocationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored entry for a token ID, if any.
    #[must_use]
    pub fn entry(&self, token_id: Uuid) -> Option<RevocationEntry> {
        self.entries.get(&token_id).map(|e| e.value().clone())
    }

    fn prune_at(&self, now: OffsetDateTime) -> u64 {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_prunable_at(now));
        (before - self.entries.len()) as u64
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token_id: Uuid, expires_at: OffsetDateTime) -> AuthResult<()> {
        self.entries
            .entry(token_id)
            .or_insert_with(|| RevocationEntry::new(token_id, expires_at));
        Ok(())
    }

    async fn is_revoked(&self, token_id: Uuid) -> AuthResult<bool> {
        Ok(self.entries.contains_key(&token_id))
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        Ok(self.prune_at(OffsetDateTime::now_utc()))
    }

    async fn len(&self) -> AuthResult<usize> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[tokio::test]
    async fn test_revoke_then_is_revoked() {
        let store = InMemoryRevocationStore::new();
        let id = Uuid::new_v4();

        assert!(!store.is_revoked(id).await.unwrap());
        store
            .revoke(id, OffsetDateTime::now_utc() + Duration::hours(1))
            .await
            .unwrap();
        assert!(store.is_revoked(id).await.unwrap());
        assert!(!store.is_revoked(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        let id = Uuid::new_v4();
        let expires_at = OffsetDateTime::now_utc() + Duration::hours(1);

        store.revoke(id, expires_at).await.unwrap();
        let first = store.entry(id).unwrap();

        store
            .revoke(id, expires_at + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(store.entry(id).unwrap(), first);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_only_removes_expired() {
        let store = InMemoryRevocationStore::new();
        let now = OffsetDateTime::now_utc();
        let live = Uuid::new_v4();
        let dead = Uuid::new_v4();

        store.revoke(live, now + Duration::hours(1)).await.unwrap();
        store.revoke(dead, now - Duration::seconds(1)).await.unwrap();

        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert!(store.is_revoked(live).await.unwrap());
        assert!(!store.is_revoked(dead).await.unwrap());
        assert_eq!(store.cleanup_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_revocations_are_visible() {
        let store = std::sync::Arc::new(InMemoryRevocationStore::new());
        let expires_at = OffsetDateTime::now_utc() + Duration::hours(1);
        let ids: Vec<Uuid> = (0..32).map(|_| Uuid::new_v4()).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let store = store.clone();
                tokio::spawn(async move { store.revoke(id, expires_at).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for id in ids {
            assert!(store.is_revoked(id).await.unwrap());
        }
    }
}
