//! Pure decision functions: `(state, command) -> events`.
//!
//! Each returns the events to record, an empty vector for a no-op, or an
//! error. New events are numbered from `state.current_version + 1` and caused
//! by the command's message id.

use accounts_core::command::Command;
use accounts_core::error::DomainError;
use accounts_core::event::EventMetadata;
use chrono::{DateTime, Utc};

use super::aggregates::CustomerState;
use super::commands::{
    ChangeCustomerEmailAddress, ChangeCustomerName, ConfirmCustomerEmailAddress, DeleteCustomer,
    RegisterCustomer,
};
use super::events::{
    CustomerDeleted, CustomerEmailAddressChanged, CustomerEmailAddressConfirmationFailed,
    CustomerEmailAddressConfirmed, CustomerEvent, CustomerEventKind, CustomerNameChanged,
    CustomerRegistered,
};

/// Reason carried by `CustomerEmailAddressConfirmationFailed`.
pub const CONFIRMATION_HASH_MISMATCH: &str = "confirmation hash does not match";

fn record(
    kind: CustomerEventKind,
    command: &impl Command,
    stream_version: i64,
    now: DateTime<Utc>,
) -> CustomerEvent {
    CustomerEvent {
        metadata: EventMetadata::new(kind.event_name(), now, command.message_id(), stream_version),
        kind,
    }
}

fn ensure_not_deleted(state: &CustomerState) -> Result<(), DomainError> {
    if state.is_deleted {
        return Err(DomainError::NotFound(format!(
            "customer {} is deleted",
            state.customer_id
        )));
    }
    Ok(())
}

/// Starts a new stream. The store rejects this if the stream already exists.
#[must_use]
pub fn register(command: &RegisterCustomer, now: DateTime<Utc>) -> CustomerEvent {
    record(
        CustomerEventKind::CustomerRegistered(CustomerRegistered {
            customer_id: command.customer_id,
            email_address: command.email_address.email_address().clone(),
            confirmation_hash: command.email_address.confirmation_hash().clone(),
            person_name: command.person_name.clone(),
        }),
        command,
        1,
        now,
    )
}

/// # Errors
///
/// Returns `DomainError::NotFound` if the customer is deleted.
pub fn confirm_email_address(
    state: &CustomerState,
    command: &ConfirmCustomerEmailAddress,
    now: DateTime<Utc>,
) -> Result<Vec<CustomerEvent>, DomainError> {
    ensure_not_deleted(state)?;

    let Some(email_address) = &state.email_address else {
        return Err(DomainError::NotFound(format!(
            "customer {} has no email address",
            state.customer_id
        )));
    };

    if email_address.is_confirmed() {
        return Ok(Vec::new());
    }

    let next_version = state.current_version + 1;

    if state.confirmation_hash.as_ref() != Some(&command.confirmation_hash) {
        return Ok(vec![record(
            CustomerEventKind::CustomerEmailAddressConfirmationFailed(
                CustomerEmailAddressConfirmationFailed {
                    customer_id: state.customer_id,
                    confirmation_hash: command.confirmation_hash.clone(),
                    reason: CONFIRMATION_HASH_MISMATCH.to_owned(),
                },
            ),
            command,
            next_version,
            now,
        )]);
    }

    Ok(vec![record(
        CustomerEventKind::CustomerEmailAddressConfirmed(CustomerEmailAddressConfirmed {
            customer_id: state.customer_id,
            email_address: email_address.email_address().clone(),
        }),
        command,
        next_version,
        now,
    )])
}

/// # Errors
///
/// Returns `DomainError::NotFound` if the customer is deleted.
pub fn change_email_address(
    state: &CustomerState,
    command: &ChangeCustomerEmailAddress,
    now: DateTime<Utc>,
) -> Result<Vec<CustomerEvent>, DomainError> {
    ensure_not_deleted(state)?;

    let new_address = command.email_address.email_address();
    let Some(current) = &state.email_address else {
        return Err(DomainError::NotFound(format!(
            "customer {} has no email address",
            state.customer_id
        )));
    };
    if current.is_same_address(new_address) {
        return Ok(Vec::new());
    }

    Ok(vec![record(
        CustomerEventKind::CustomerEmailAddressChanged(CustomerEmailAddressChanged {
            customer_id: state.customer_id,
            email_address: new_address.clone(),
            confirmation_hash: command.email_address.confirmation_hash().clone(),
            previous_email_address: current.email_address().clone(),
        }),
        command,
        state.current_version + 1,
        now,
    )])
}

/// # Errors
///
/// Returns `DomainError::NotFound` if the customer is deleted.
pub fn change_name(
    state: &CustomerState,
    command: &ChangeCustomerName,
    now: DateTime<Utc>,
) -> Result<Vec<CustomerEvent>, DomainError> {
    ensure_not_deleted(state)?;

    if state.person_name.as_ref() == Some(&command.person_name) {
        return Ok(Vec::new());
    }

    Ok(vec![record(
        CustomerEventKind::CustomerNameChanged(CustomerNameChanged {
            customer_id: state.customer_id,
            person_name: command.person_name.clone(),
        }),
        command,
        state.current_version + 1,
        now,
    )])
}

/// Deleting twice is a no-op.
///
/// # Errors
///
/// Never fails today; the signature matches the other decisions.
#[allow(clippy::unnecessary_wraps)]
pub fn delete(
    state: &CustomerState,
    command: &DeleteCustomer,
    now: DateTime<Utc>,
) -> Result<Vec<CustomerEvent>, DomainError> {
    if state.is_deleted {
        return Ok(Vec::new());
    }

    Ok(vec![record(
        CustomerEventKind::CustomerDeleted(CustomerDeleted {
            customer_id: state.customer_id,
        }),
        command,
        state.current_version + 1,
        now,
    )])
}
