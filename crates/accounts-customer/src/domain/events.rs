//! Domain events for the Customer context.

use accounts_core::email::EmailAddress;
use accounts_core::error::DomainError;
use accounts_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

use super::values::{ConfirmationHash, CustomerId, PersonName};

pub const CUSTOMER_REGISTERED: &str = "CustomerRegistered";
pub const CUSTOMER_EMAIL_ADDRESS_CONFIRMED: &str = "CustomerEmailAddressConfirmed";
pub const CUSTOMER_EMAIL_ADDRESS_CONFIRMATION_FAILED: &str =
    "CustomerEmailAddressConfirmationFailed";
pub const CUSTOMER_EMAIL_ADDRESS_CHANGED: &str = "CustomerEmailAddressChanged";
pub const CUSTOMER_NAME_CHANGED: &str = "CustomerNameChanged";
pub const CUSTOMER_DELETED: &str = "CustomerDeleted";

/// Emitted when a customer registers. Always version 1 of its stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRegistered {
    pub customer_id: CustomerId,
    pub email_address: EmailAddress,
    pub confirmation_hash: ConfirmationHash,
    pub person_name: PersonName,
}

/// Emitted when the customer supplies the matching confirmation hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEmailAddressConfirmed {
    pub customer_id: CustomerId,
    pub email_address: EmailAddress,
}

/// Failure event: a confirmation attempt carried the wrong hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEmailAddressConfirmationFailed {
    pub customer_id: CustomerId,
    pub confirmation_hash: ConfirmationHash,
    pub reason: String,
}

/// Emitted when the customer switches to a new, unconfirmed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEmailAddressChanged {
    pub customer_id: CustomerId,
    pub email_address: EmailAddress,
    pub confirmation_hash: ConfirmationHash,
    pub previous_email_address: EmailAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNameChanged {
    pub customer_id: CustomerId,
    pub person_name: PersonName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDeleted {
    pub customer_id: CustomerId,
}

/// Event payload variants for the Customer context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerEventKind {
    /// A customer has registered.
    CustomerRegistered(CustomerRegistered),
    /// The current email address has been confirmed.
    CustomerEmailAddressConfirmed(CustomerEmailAddressConfirmed),
    /// A confirmation attempt was rejected.
    CustomerEmailAddressConfirmationFailed(CustomerEmailAddressConfirmationFailed),
    /// The email address has changed.
    CustomerEmailAddressChanged(CustomerEmailAddressChanged),
    /// The name has changed.
    CustomerNameChanged(CustomerNameChanged),
    /// The customer has been deleted.
    CustomerDeleted(CustomerDeleted),
}

impl CustomerEventKind {
    /// The unqualified event name stored alongside the payload.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::CustomerRegistered(_) => CUSTOMER_REGISTERED,
            Self::CustomerEmailAddressConfirmed(_) => CUSTOMER_EMAIL_ADDRESS_CONFIRMED,
            Self::CustomerEmailAddressConfirmationFailed(_) => {
                CUSTOMER_EMAIL_ADDRESS_CONFIRMATION_FAILED
            }
            Self::CustomerEmailAddressChanged(_) => CUSTOMER_EMAIL_ADDRESS_CHANGED,
            Self::CustomerNameChanged(_) => CUSTOMER_NAME_CHANGED,
            Self::CustomerDeleted(_) => CUSTOMER_DELETED,
        }
    }
}

/// Domain event envelope for the Customer context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: CustomerEventKind,
}

impl DomainEvent for CustomerEvent {
    fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            CustomerEventKind::CustomerEmailAddressConfirmationFailed(_)
        )
    }

    fn failure_reason(&self) -> Option<DomainError> {
        match &self.kind {
            CustomerEventKind::CustomerEmailAddressConfirmationFailed(failed) => Some(
                DomainError::DomainConstraintsViolation(failed.reason.clone()),
            ),
            _ => None,
        }
    }
}
