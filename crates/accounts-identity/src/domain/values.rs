//! Identifier value for the Identity context.

use std::fmt;

use accounts_core::error::DomainError;
use accounts_core::stream::StreamId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stream prefix for identity streams.
pub const IDENTITY_STREAM_PREFIX: &str = "identity";

/// Identity aggregate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Parses an identity id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if `input` is empty or not a UUID.
    pub fn build(input: &str) -> Result<Self, DomainError> {
        if input.trim().is_empty() {
            return Err(DomainError::InputInvalid("identity id must not be empty".into()));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| DomainError::InputInvalid(format!("identity id {input:?}: {e}")))
    }

    #[must_use]
    pub const fn rebuild(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        StreamId::new(IDENTITY_STREAM_PREFIX, self.0)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
