//! Identity state, derived by replaying the identity's event stream.

use accounts_core::aggregate::Projection;
use accounts_core::email::EmailAddress;
use accounts_core::event::DomainEvent;

use super::events::{IdentityEvent, IdentityEventKind};
use super::password::HashedPassword;
use super::values::IdentityId;

/// Current state of one identity. Never stored, only replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityState {
    pub identity_id: IdentityId,
    pub email_address: Option<EmailAddress>,
    pub hashed_password: Option<HashedPassword>,
    pub is_deleted: bool,
    pub current_version: i64,
}

impl IdentityState {
    #[must_use]
    pub fn new(identity_id: IdentityId) -> Self {
        Self {
            identity_id,
            email_address: None,
            hashed_password: None,
            is_deleted: false,
            current_version: 0,
        }
    }
}

impl Projection for IdentityState {
    type Event = IdentityEvent;

    fn apply(&mut self, event: &IdentityEvent) {
        match &event.kind {
            IdentityEventKind::IdentityRegistered(registered) => {
                self.identity_id = registered.identity_id;
                self.email_address = Some(registered.email_address.clone());
                self.hashed_password = Some(registered.hashed_password.clone());
            }
            IdentityEventKind::IdentityDeleted(_) => {
                self.is_deleted = true;
            }
        }
        self.current_version = event.metadata().stream_version;
    }

    fn current_version(&self) -> i64 {
        self.current_version
    }
}
