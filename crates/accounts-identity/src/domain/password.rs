//! Plain and Argon2id-hashed passwords.

use std::fmt;

use accounts_core::error::DomainError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

/// Length of the derived key in bytes.
pub const HASH_LENGTH: usize = 32;
/// Length of the random salt in bytes.
pub const SALT_LENGTH: usize = 16;

pub const MIN_PASSWORD_LENGTH: usize = 12;
pub const MAX_PASSWORD_LENGTH: usize = 250;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashingParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl PasswordHashingParams {
    pub const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    pub const DEFAULT_ITERATIONS: u32 = 1;
    pub const DEFAULT_PARALLELISM: u32 = 4;

    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if Argon2 rejects the combination.
    pub fn build(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, DomainError> {
        let params = Self {
            memory_kib,
            iterations,
            parallelism,
        };
        params.argon2()?;
        Ok(params)
    }

    fn argon2(self) -> Result<Argon2<'static>, DomainError> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(HASH_LENGTH),
        )
        .map_err(|e| DomainError::InputInvalid(format!("argon2 parameters: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for PasswordHashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            iterations: Self::DEFAULT_ITERATIONS,
            parallelism: Self::DEFAULT_PARALLELISM,
        }
    }
}

/// A password as typed by the user, trimmed. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(String);

impl PlainPassword {
    /// Trims `input` and checks its length in characters.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` unless the trimmed password has
    /// 12 to 250 characters.
    pub fn build(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let length = trimmed.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(DomainError::InputInvalid(format!(
                "password must have {MIN_PASSWORD_LENGTH} to {MAX_PASSWORD_LENGTH} characters, got {length}"
            )));
        }
        Ok(Self(trimmed.to_owned()))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(<redacted>)")
    }
}

/// A PHC-encoded Argon2id hash, e.g. `$argon2id$v=19$m=65536,t=1,p=4$...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Hashes `password` with a fresh 16-byte salt. CPU-heavy; run it off the
    /// async executor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for bad parameters and
    /// `DomainError::Technical` if hashing fails.
    pub fn hash(
        password: &PlainPassword,
        params: PasswordHashingParams,
    ) -> Result<Self, DomainError> {
        let argon2 = params.argon2()?;
        let salt_bytes: [u8; SALT_LENGTH] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| DomainError::Technical(format!("encode password salt: {e}")))?;
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DomainError::Technical(format!("hash password: {e}")))?;
        Ok(Self(hash.to_string()))
    }

    #[must_use]
    pub fn rebuild(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Verifies `password` using the parameters encoded in the hash. A hash
    /// that does not parse never matches.
    #[must_use]
    pub fn matches(&self, password: &PlainPassword) -> bool {
        PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
