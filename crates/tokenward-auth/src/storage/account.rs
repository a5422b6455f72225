//! Account storage.
//!
//! The token subsystem only needs one capability from accounts: turn
//! credentials into a [`UserIdentity`] or refuse. Registration is provided so
//! the HTTP surface can be exercised end to end.

use std::fmt;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::PasswordHashing;
use crate::types::{UserId, UserIdentity};

/// Maximum username length.
pub const MAX_USERNAME_LEN: usize = 150;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Username and password pair submitted by a client.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plaintext password. Never logged.
    pub password: String,
}

impl Credentials {
    /// Creates a new credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account collaborator used by the login and register endpoints.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Verifies credentials and returns the matching identity.
    ///
    /// # Errors
    ///
    /// Returns `AccountInvalid` for unknown users or wrong passwords, without
    /// revealing which.
    async fn verify(&self, credentials: &Credentials) -> AuthResult<UserIdentity>;

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the username is syntactically invalid,
    /// already taken, or the password is empty.
    async fn register(&self, credentials: &Credentials) -> AuthResult<UserIdentity>;
}

/// Validates username syntax: 1 to 150 characters, letters, digits and `@.+-_`.
///
/// # Errors
///
/// Returns `InvalidRequest` describing the violated rule.
pub fn validate_username(username: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(AuthError::invalid_request("username: This field may not be blank."));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::invalid_request(format!(
            "username: Ensure this field has no more than {MAX_USERNAME_LEN} characters."
        )));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(AuthError::invalid_request(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

// =============================================================================
// In-memory implementation
// =============================================================================

#[derive(Debug, Clone)]
struct AccountRecord {
    id: UserId,
    username: String,
    password_hash: String,
}

impl AccountRecord {
    fn identity(&self) -> UserIdentity {
        UserIdentity::new(self.id.clone(), self.username.clone())
    }
}

/// Process-local account store with Argon2id password hashes.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<String, AccountRecord>,
    hashing: PasswordHashing,
}

impl InMemoryAccountStore {
    /// Creates an empty store with default Argon2 parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the password hasher.
    #[must_use]
    pub fn with_hashing(mut self, hashing: PasswordHashing) -> Self {
        self.hashing = hashing;
        self
    }

    /// Returns the number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if no accounts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn verify(&self, credentials: &Credentials) -> AuthResult<UserIdentity> {
        let Some(record) = self
            .accounts
            .get(&credentials.username)
            .map(|r| r.value().clone())
        else {
            tracing::debug!(username = %credentials.username, "Login for unknown account");
            return Err(AuthError::account_invalid(INVALID_CREDENTIALS));
        };

        let hashing = self.hashing.clone();
        let password = credentials.password.clone();
        let hash = record.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hashing.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AuthError::internal(format!("Stored password hash is invalid: {e}")))?;

        if !matches {
            tracing::debug!(user_id = %record.id, "Password mismatch");
            return Err(AuthError::account_invalid(INVALID_CREDENTIALS));
        }

        Ok(record.identity())
    }

    async fn register(&self, credentials: &Credentials) -> AuthResult<UserIdentity> {
        validate_username(&credentials.username)?;
        if credentials.password.is_empty() {
            return Err(AuthError::invalid_request("password: This field may not be blank."));
        }
        if self.accounts.contains_key(&credentials.username) {
            return Err(duplicate_username());
        }

        let hashing = self.hashing.clone();
        let password = credentials.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hashing.hash(&password))
            .await
            .map_err(|e| AuthError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AuthError::internal(format!("Password hashing failed: {e}")))?;

        let record = AccountRecord {
            id: UserId::new(Uuid::new_v4().to_string()),
            username: credentials.username.clone(),
            password_hash,
        };

        // Another registration may have won the race while hashing.
        match self.accounts.entry(credentials.username.clone()) {
            Entry::Occupied(_) => Err(duplicate_username()),
            Entry::Vacant(slot) => {
                let identity = record.identity();
                slot.insert(record);
                tracing::info!(user_id = %identity.id, "Account registered");
                Ok(identity)
            }
        }
    }
}

fn duplicate_username() -> AuthError {
    AuthError::invalid_request("username: A user with that username already exists.")
}
