//! Query handlers for the Identity context.

use accounts_core::error::{DomainError, ErrorKind, ResultExt};
use accounts_core::repository::{EventStore, UniqueIndex};
use tracing::{debug, instrument};

use crate::application::command_handlers::load_identity;
use crate::domain::commands::VerifyCredentials;
use crate::domain::decisions;
use crate::domain::values::IdentityId;

/// Resolves credentials to the identity they belong to.
///
/// Unknown addresses, deleted identities and wrong passwords are all reported
/// as `InvalidCredentials`. The owner lookup may be stale by one concurrent
/// write; a stale hit on a deleted or missing identity is rejected the same way.
///
/// # Errors
///
/// Returns `DomainError::InvalidCredentials`, or any store error.
#[instrument(skip(query, store), fields(email_address = %query.email_address))]
pub async fn verify_credentials(
    query: &VerifyCredentials,
    store: &dyn EventStore,
) -> Result<IdentityId, DomainError> {
    let owner = store
        .find_owner(UniqueIndex::IdentityEmailAddress, query.email_address.as_str())
        .await
        .context("look up identity by email address")?;
    let Some(owner) = owner else {
        debug!("no identity for email address");
        return Err(DomainError::InvalidCredentials);
    };
    let identity_id = IdentityId::build(&owner).map_err(|e| {
        DomainError::UnmarshalingFailed(format!("unique_identities owner {owner:?}: {e}"))
    })?;

    let state = match load_identity(identity_id, &identity_id.stream_id(), store).await {
        Ok(state) => state,
        Err(err) if err.is(ErrorKind::NotFound) => return Err(DomainError::InvalidCredentials),
        Err(err) => return Err(err),
    };

    let password = query.password.clone();
    tokio::task::spawn_blocking(move || decisions::is_matching_password(&state, &password))
        .await
        .map_err(|e| DomainError::Technical(format!("password verification task: {e}")))??;

    Ok(identity_id)
}
