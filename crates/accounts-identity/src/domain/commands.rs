//! Commands and queries for the Identity context.

use accounts_core::command::Command;
use accounts_core::email::EmailAddress;
use accounts_core::error::DomainError;
use uuid::Uuid;

use super::password::PlainPassword;
use super::values::IdentityId;

/// Command to register a new identity.
#[derive(Debug, Clone)]
pub struct RegisterIdentity {
    /// Id of this command message.
    pub message_id: Uuid,
    /// The id the new identity will get.
    pub identity_id: IdentityId,
    pub email_address: EmailAddress,
    /// Hashed by the handler before anything is recorded.
    pub password: PlainPassword,
}

impl RegisterIdentity {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed address or a
    /// password of the wrong length.
    pub fn build(email_address: &str, password: &str) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            identity_id: IdentityId::generate(),
            email_address: EmailAddress::build(email_address)?,
            password: PlainPassword::build(password)?,
        })
    }
}

/// Command to delete an identity.
#[derive(Debug, Clone)]
pub struct DeleteIdentity {
    /// Id of this command message.
    pub message_id: Uuid,
    pub identity_id: IdentityId,
}

impl DeleteIdentity {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed id.
    pub fn build(identity_id: &str) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            identity_id: IdentityId::build(identity_id)?,
        })
    }
}

impl Command for RegisterIdentity {
    fn command_name(&self) -> &'static str {
        "RegisterIdentity"
    }

    fn message_id(&self) -> Uuid {
        self.message_id
    }
}

impl Command for DeleteIdentity {
    fn command_name(&self) -> &'static str {
        "DeleteIdentity"
    }

    fn message_id(&self) -> Uuid {
        self.message_id
    }
}

/// Query: which identity, if any, do these credentials belong to?
#[derive(Debug, Clone)]
pub struct VerifyCredentials {
    pub email_address: EmailAddress,
    pub password: PlainPassword,
}

impl VerifyCredentials {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed address or a
    /// password of the wrong length.
    pub fn build(email_address: &str, password: &str) -> Result<Self, DomainError> {
        Ok(Self {
            email_address: EmailAddress::build(email_address)?,
            password: PlainPassword::build(password)?,
        })
    }
}
