//! Maps recorded customer events to `unique_email_addresses` mutations.

use accounts_core::repository::{UniqueIndex, UniqueIndexAction};

use crate::domain::events::{CustomerEvent, CustomerEventKind};

/// One action per email-carrying event, in event order.
#[must_use]
pub fn unique_email_address_actions(events: &[CustomerEvent]) -> Vec<UniqueIndexAction> {
    events
        .iter()
        .filter_map(|event| match &event.kind {
            CustomerEventKind::CustomerRegistered(registered) => Some(UniqueIndexAction::Add {
                index: UniqueIndex::CustomerEmailAddress,
                key: registered.email_address.to_string(),
                owner: registered.customer_id.to_string(),
            }),
            CustomerEventKind::CustomerEmailAddressChanged(changed) => {
                Some(UniqueIndexAction::Replace {
                    index: UniqueIndex::CustomerEmailAddress,
                    key: changed.email_address.to_string(),
                    owner: changed.customer_id.to_string(),
                })
            }
            CustomerEventKind::CustomerDeleted(deleted) => Some(UniqueIndexAction::Remove {
                index: UniqueIndex::CustomerEmailAddress,
                owner: deleted.customer_id.to_string(),
            }),
            CustomerEventKind::CustomerEmailAddressConfirmed(_)
            | CustomerEventKind::CustomerEmailAddressConfirmationFailed(_)
            | CustomerEventKind::CustomerNameChanged(_) => None,
        })
        .collect()
}
