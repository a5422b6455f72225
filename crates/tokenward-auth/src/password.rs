//! Argon2 password hashing.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode)
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Hashes are stored in PHC string format
//!
//! Both operations are CPU-bound; async callers should run them on
//! `tokio::task::spawn_blocking`.
//!
//! # Example
//!
//! ```
//! use tokenward_auth::password::PasswordHashing;
//!
//! let hashing = PasswordHashing::default();
//! let hash = hashing.hash("my_secure_password").unwrap();
//!
//! assert!(hashing.verify("my_secure_password", &hash).unwrap());
//! assert!(!hashing.verify("wrong_password", &hash).unwrap());
//! ```

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

/// Argon2id hasher with fixed cost parameters.
#[derive(Clone, Default)]
pub struct PasswordHashing {
    argon2: Argon2<'static>,
}

impl PasswordHashing {
    /// Creates a hasher with explicit Argon2id cost parameters.
    ///
    /// # Arguments
    ///
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Time cost
    /// * `parallelism` - Degree of parallelism
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are outside Argon2's accepted range.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, argon2::Error> {
        let params = Params::new(memory_kib, iterations, parallelism, None)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes a password for storage.
    ///
    /// # Errors
    ///
    /// Returns `argon2::password_hash::Error` if hashing fails (rare).
    pub fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored PHC hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only if the hash format is invalid.
    ///
    /// # Errors
    ///
    /// Returns `argon2::password_hash::Error` if `hash` cannot be parsed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(hash)?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

impl std::fmt::Debug for PasswordHashing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHashing").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHashing {
        PasswordHashing::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hashing = cheap();
        let hash = hashing.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hashing.verify("correct horse", &hash).unwrap());
        assert!(!hashing.verify("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hashing = cheap();
        let first = hashing.hash("same").unwrap();
        let second = hashing.hash("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(cheap().verify("password", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PasswordHashing::with_params(0, 0, 0).is_err());
    }
}
