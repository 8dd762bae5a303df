//! Command handlers for the Identity context.

use accounts_core::aggregate::Projection;
use accounts_core::error::{DomainError, ErrorKind, ResultExt};
use accounts_core::repository::EventStore;
use accounts_core::retry::retry_on_concurrency_conflict;
use accounts_core::stream::StreamId;
use accounts_core::time::Clock;
use tracing::{debug, info, instrument};

use crate::application::serialization::{from_stored_event, to_stored_event};
use crate::application::unique_identities::unique_identity_actions;
use crate::domain::aggregates::IdentityState;
use crate::domain::commands::{DeleteIdentity, RegisterIdentity};
use crate::domain::decisions;
use crate::domain::events::IdentityEvent;
use crate::domain::password::{HashedPassword, PasswordHashingParams, PlainPassword};
use crate::domain::values::IdentityId;

/// Loads and replays the full stream of `identity_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the stream is empty, or any load or
/// unmarshaling error.
pub(crate) async fn load_identity(
    identity_id: IdentityId,
    stream_id: &StreamId,
    store: &dyn EventStore,
) -> Result<IdentityState, DomainError> {
    let stored = store
        .retrieve(stream_id, 1, usize::MAX)
        .await
        .context("load identity stream")?;
    if stored.is_empty() {
        return Err(DomainError::NotFound(format!("identity {identity_id}")));
    }
    debug!(count = stored.len(), "loaded identity events");

    let events = stored
        .iter()
        .map(from_stored_event)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IdentityState::new(identity_id).replay(&events))
}

async fn record(
    stream_id: &StreamId,
    recorded: &[IdentityEvent],
    store: &dyn EventStore,
) -> Result<(), DomainError> {
    let stored = recorded
        .iter()
        .map(|event| to_stored_event(stream_id, event))
        .collect::<Result<Vec<_>, _>>()?;
    let actions = unique_identity_actions(recorded);
    store
        .append(stream_id, &stored, &actions)
        .await
        .context("append identity events")
}

/// Runs Argon2id on the blocking pool.
///
/// # Errors
///
/// Returns `DomainError::Technical` if hashing fails or the task panics.
pub(crate) async fn hash_password(
    password: PlainPassword,
    params: PasswordHashingParams,
) -> Result<HashedPassword, DomainError> {
    tokio::task::spawn_blocking(move || HashedPassword::hash(&password, params))
        .await
        .map_err(|e| DomainError::Technical(format!("password hashing task: {e}")))?
}

/// Handles `RegisterIdentity`: hashes the password once, then starts the
/// identity's stream and claims the email address.
///
/// # Errors
///
/// Returns `DomainError::Duplicate` if the address is taken or the stream
/// already exists, or any hashing or store error.
#[instrument(skip(params, clock, store), fields(identity_id = %command.identity_id))]
pub async fn handle_register_identity(
    command: &RegisterIdentity,
    params: PasswordHashingParams,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<IdentityId, DomainError> {
    let hashed_password = hash_password(command.password.clone(), params).await?;
    let hashed_password = &hashed_password;
    let stream_id = command.identity_id.stream_id();
    let stream_id = &stream_id;

    retry_on_concurrency_conflict(max_retries, move || async move {
        let recorded = [decisions::register(
            command,
            hashed_password.clone(),
            clock.now(),
        )];
        record(stream_id, &recorded, store).await.map_err(|err| {
            if err.is(ErrorKind::ConcurrencyConflict) {
                DomainError::Duplicate("found duplicate identity".into())
            } else {
                err
            }
        })
    })
    .await
    .context("RegisterIdentity")?;

    info!("identity registered");
    Ok(command.identity_id)
}

/// Handles `DeleteIdentity`. Deleting a deleted identity succeeds silently.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an identity that never existed, or any
/// store error.
#[instrument(skip(clock, store), fields(identity_id = %command.identity_id))]
pub async fn handle_delete_identity(
    command: &DeleteIdentity,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<(), DomainError> {
    let stream_id = command.identity_id.stream_id();
    let stream_id = &stream_id;

    retry_on_concurrency_conflict(max_retries, move || async move {
        let state = load_identity(command.identity_id, stream_id, store).await?;
        let recorded = decisions::delete(&state, command, clock.now());
        if recorded.is_empty() {
            debug!(stream_version = state.current_version, "nothing to record");
            return Ok(());
        }
        record(stream_id, &recorded, store).await
    })
    .await
    .context("DeleteIdentity")
}
