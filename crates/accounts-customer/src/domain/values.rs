//! Value objects for the Customer context.
//!
//! `build` validates and fails with `InputInvalid`; `rebuild` trusts values
//! read back from storage; `generate` produces a fresh value.

use std::fmt;

use accounts_core::email::EmailAddress;
use accounts_core::error::DomainError;
use accounts_core::stream::StreamId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Stream prefix for customer streams.
pub const CUSTOMER_STREAM_PREFIX: &str = "customer";

/// Customer aggregate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Parses a customer id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if `input` is empty or not a UUID.
    pub fn build(input: &str) -> Result<Self, DomainError> {
        if input.trim().is_empty() {
            return Err(DomainError::InputInvalid("customer id must not be empty".into()));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| DomainError::InputInvalid(format!("customer id {input:?}: {e}")))
    }

    /// Wraps an id known to be valid.
    #[must_use]
    pub const fn rebuild(id: Uuid) -> Self {
        Self(id)
    }

    /// A fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The stream holding this customer's events.
    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        StreamId::new(CUSTOMER_STREAM_PREFIX, self.0)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A customer's given and family name, both non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    given_name: String,
    family_name: String,
}

impl PersonName {
    /// Trims and validates both parts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if either part is blank.
    pub fn build(given_name: &str, family_name: &str) -> Result<Self, DomainError> {
        let given_name = given_name.trim();
        let family_name = family_name.trim();
        if given_name.is_empty() {
            return Err(DomainError::InputInvalid("given name must not be empty".into()));
        }
        if family_name.is_empty() {
            return Err(DomainError::InputInvalid("family name must not be empty".into()));
        }
        Ok(Self::rebuild(given_name, family_name))
    }

    #[must_use]
    pub fn rebuild(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
        }
    }

    #[must_use]
    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    #[must_use]
    pub fn family_name(&self) -> &str {
        &self.family_name
    }
}

/// Hex-encoded SHA-256 that a customer echoes back to confirm an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationHash(String);

impl ConfirmationHash {
    /// Accepts any non-empty hash supplied by a caller.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if `input` is empty.
    pub fn build(input: &str) -> Result<Self, DomainError> {
        if input.is_empty() {
            return Err(DomainError::InputInvalid("confirmation hash must not be empty".into()));
        }
        Ok(Self(input.to_owned()))
    }

    #[must_use]
    pub fn rebuild(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `SHA-256(email || random u64)`, hex-encoded.
    #[must_use]
    pub fn generate(email_address: &EmailAddress) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(email_address.as_str().as_bytes());
        hasher.update(rand::random::<u64>().to_string().as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An address awaiting confirmation, with the hash that confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnconfirmedEmailAddress {
    email_address: EmailAddress,
    confirmation_hash: ConfirmationHash,
}

impl UnconfirmedEmailAddress {
    /// Validates `input` and generates its confirmation hash.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if `input` is not an email address.
    pub fn build(input: &str) -> Result<Self, DomainError> {
        let email_address = EmailAddress::build(input)?;
        let confirmation_hash = ConfirmationHash::generate(&email_address);
        Ok(Self {
            email_address,
            confirmation_hash,
        })
    }

    #[must_use]
    pub fn rebuild(email_address: EmailAddress, confirmation_hash: ConfirmationHash) -> Self {
        Self {
            email_address,
            confirmation_hash,
        }
    }

    #[must_use]
    pub fn email_address(&self) -> &EmailAddress {
        &self.email_address
    }

    #[must_use]
    pub fn confirmation_hash(&self) -> &ConfirmationHash {
        &self.confirmation_hash
    }
}

/// An address the customer has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedEmailAddress {
    email_address: EmailAddress,
}

impl ConfirmedEmailAddress {
    #[must_use]
    pub fn rebuild(email_address: EmailAddress) -> Self {
        Self { email_address }
    }

    #[must_use]
    pub fn email_address(&self) -> &EmailAddress {
        &self.email_address
    }
}

/// Either kind of customer email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerEmailAddress {
    /// Registered or changed, not yet confirmed.
    Unconfirmed(UnconfirmedEmailAddress),
    /// Confirmed with the matching hash.
    Confirmed(ConfirmedEmailAddress),
}

impl CustomerEmailAddress {
    #[must_use]
    pub fn email_address(&self) -> &EmailAddress {
        match self {
            Self::Unconfirmed(email) => email.email_address(),
            Self::Confirmed(email) => email.email_address(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.email_address().as_str()
    }

    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// Compares plain address text, ignoring whether either side is confirmed.
    #[must_use]
    pub fn is_same_address(&self, other: &EmailAddress) -> bool {
        self.as_str() == other.as_str()
    }
}
