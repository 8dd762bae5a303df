//! Commands for the Customer context.
//!
//! Each `build` validates raw input into value objects, so a command that
//! exists is well-formed.

use accounts_core::command::Command;
use accounts_core::error::DomainError;
use uuid::Uuid;

use super::values::{ConfirmationHash, CustomerId, PersonName, UnconfirmedEmailAddress};

/// Command to register a new customer.
#[derive(Debug, Clone)]
pub struct RegisterCustomer {
    /// Id of this command message.
    pub message_id: Uuid,
    /// The id the new customer will get.
    pub customer_id: CustomerId,
    pub email_address: UnconfirmedEmailAddress,
    pub person_name: PersonName,
}

impl RegisterCustomer {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed address or blank name.
    pub fn build(
        email_address: &str,
        given_name: &str,
        family_name: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            customer_id: CustomerId::generate(),
            email_address: UnconfirmedEmailAddress::build(email_address)?,
            person_name: PersonName::build(given_name, family_name)?,
        })
    }
}

/// Command to confirm a customer's current email address.
#[derive(Debug, Clone)]
pub struct ConfirmCustomerEmailAddress {
    /// Id of this command message.
    pub message_id: Uuid,
    pub customer_id: CustomerId,
    pub confirmation_hash: ConfirmationHash,
}

impl ConfirmCustomerEmailAddress {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed id or empty hash.
    pub fn build(customer_id: &str, confirmation_hash: &str) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            customer_id: CustomerId::build(customer_id)?,
            confirmation_hash: ConfirmationHash::build(confirmation_hash)?,
        })
    }
}

/// Command to change a customer's email address.
#[derive(Debug, Clone)]
pub struct ChangeCustomerEmailAddress {
    /// Id of this command message.
    pub message_id: Uuid,
    pub customer_id: CustomerId,
    /// The new address, with its freshly generated confirmation hash.
    pub email_address: UnconfirmedEmailAddress,
}

impl ChangeCustomerEmailAddress {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed id or address.
    pub fn build(customer_id: &str, email_address: &str) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            customer_id: CustomerId::build(customer_id)?,
            email_address: UnconfirmedEmailAddress::build(email_address)?,
        })
    }
}

/// Command to change a customer's name.
#[derive(Debug, Clone)]
pub struct ChangeCustomerName {
    /// Id of this command message.
    pub message_id: Uuid,
    pub customer_id: CustomerId,
    pub person_name: PersonName,
}

impl ChangeCustomerName {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed id or blank name.
    pub fn build(
        customer_id: &str,
        given_name: &str,
        family_name: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            customer_id: CustomerId::build(customer_id)?,
            person_name: PersonName::build(given_name, family_name)?,
        })
    }
}

/// Command to delete a customer.
#[derive(Debug, Clone)]
pub struct DeleteCustomer {
    /// Id of this command message.
    pub message_id: Uuid,
    pub customer_id: CustomerId,
}

impl DeleteCustomer {
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` for a malformed id.
    pub fn build(customer_id: &str) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: Uuid::new_v4(),
            customer_id: CustomerId::build(customer_id)?,
        })
    }
}

macro_rules! impl_command {
    ($($command:ident),+ $(,)?) => {
        $(
            impl Command for $command {
                fn command_name(&self) -> &'static str {
                    stringify!($command)
                }

                fn message_id(&self) -> Uuid {
                    self.message_id
                }
            }
        )+
    };
}

impl_command!(
    RegisterCustomer,
    ConfirmCustomerEmailAddress,
    ChangeCustomerEmailAddress,
    ChangeCustomerName,
    DeleteCustomer,
);
