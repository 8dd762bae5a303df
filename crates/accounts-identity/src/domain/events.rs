//! Domain events for the Identity context.

use accounts_core::email::EmailAddress;
use accounts_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

use super::password::HashedPassword;
use super::values::IdentityId;

pub const IDENTITY_REGISTERED: &str = "IdentityRegistered";
pub const IDENTITY_DELETED: &str = "IdentityDeleted";

/// Emitted when an identity registers. Always version 1 of its stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRegistered {
    pub identity_id: IdentityId,
    pub email_address: EmailAddress,
    pub hashed_password: HashedPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDeleted {
    pub identity_id: IdentityId,
}

/// Event payload variants for the Identity context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEventKind {
    /// An identity has registered.
    IdentityRegistered(IdentityRegistered),
    /// The identity has been deleted.
    IdentityDeleted(IdentityDeleted),
}

impl IdentityEventKind {
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::IdentityRegistered(_) => IDENTITY_REGISTERED,
            Self::IdentityDeleted(_) => IDENTITY_DELETED,
        }
    }
}

/// Domain event envelope for the Identity context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: IdentityEventKind,
}

impl DomainEvent for IdentityEvent {
    fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
