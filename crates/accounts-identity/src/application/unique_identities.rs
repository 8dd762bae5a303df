//! Maps recorded identity events to `unique_identities` mutations.

use accounts_core::repository::{UniqueIndex, UniqueIndexAction};

use crate::domain::events::{IdentityEvent, IdentityEventKind};

#[must_use]
pub fn unique_identity_actions(events: &[IdentityEvent]) -> Vec<UniqueIndexAction> {
    events
        .iter()
        .map(|event| match &event.kind {
            IdentityEventKind::IdentityRegistered(registered) => UniqueIndexAction::Add {
                index: UniqueIndex::IdentityEmailAddress,
                key: registered.email_address.to_string(),
                owner: registered.identity_id.to_string(),
            },
            IdentityEventKind::IdentityDeleted(deleted) => UniqueIndexAction::Remove {
                index: UniqueIndex::IdentityEmailAddress,
                owner: deleted.identity_id.to_string(),
            },
        })
        .collect()
}
