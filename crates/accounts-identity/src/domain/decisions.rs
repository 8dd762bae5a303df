//! Pure decision functions for the Identity context.

use accounts_core::command::Command;
use accounts_core::error::DomainError;
use accounts_core::event::EventMetadata;
use chrono::{DateTime, Utc};

use super::aggregates::IdentityState;
use super::commands::{DeleteIdentity, RegisterIdentity};
use super::events::{IdentityDeleted, IdentityEvent, IdentityEventKind, IdentityRegistered};
use super::password::{HashedPassword, PlainPassword};

fn record(
    kind: IdentityEventKind,
    command: &impl Command,
    stream_version: i64,
    now: DateTime<Utc>,
) -> IdentityEvent {
    IdentityEvent {
        metadata: EventMetadata::new(kind.event_name(), now, command.message_id(), stream_version),
        kind,
    }
}

/// Starts a new stream with the already hashed password.
#[must_use]
pub fn register(
    command: &RegisterIdentity,
    hashed_password: HashedPassword,
    now: DateTime<Utc>,
) -> IdentityEvent {
    record(
        IdentityEventKind::IdentityRegistered(IdentityRegistered {
            identity_id: command.identity_id,
            email_address: command.email_address.clone(),
            hashed_password,
        }),
        command,
        1,
        now,
    )
}

/// Deleting twice is a no-op.
#[must_use]
pub fn delete(
    state: &IdentityState,
    command: &DeleteIdentity,
    now: DateTime<Utc>,
) -> Vec<IdentityEvent> {
    if state.is_deleted {
        return Vec::new();
    }
    vec![record(
        IdentityEventKind::IdentityDeleted(IdentityDeleted {
            identity_id: state.identity_id,
        }),
        command,
        state.current_version + 1,
        now,
    )]
}

/// Checks `password` against the identity's stored hash. CPU-heavy.
///
/// # Errors
///
/// Returns `DomainError::InvalidCredentials` if the identity is deleted, has
/// no password, or the password does not match.
pub fn is_matching_password(
    state: &IdentityState,
    password: &PlainPassword,
) -> Result<(), DomainError> {
    if state.is_deleted {
        return Err(DomainError::InvalidCredentials);
    }
    match &state.hashed_password {
        Some(hashed) if hashed.matches(password) => Ok(()),
        _ => Err(DomainError::InvalidCredentials),
    }
}
