//! Customer state, derived by replaying the customer's event stream.

use accounts_core::aggregate::Projection;
use accounts_core::event::DomainEvent;

use super::events::{CustomerEvent, CustomerEventKind};
use super::values::{
    ConfirmationHash, ConfirmedEmailAddress, CustomerEmailAddress, CustomerId, PersonName,
    UnconfirmedEmailAddress,
};

/// Current state of one customer. Never stored, only replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerState {
    /// Aggregate identifier.
    pub customer_id: CustomerId,
    pub person_name: Option<PersonName>,
    pub email_address: Option<CustomerEmailAddress>,
    /// Hash that confirms the current address.
    pub confirmation_hash: Option<ConfirmationHash>,
    pub is_deleted: bool,
    /// Current version (event count).
    pub current_version: i64,
}

impl CustomerState {
    /// State of a customer with no events yet.
    #[must_use]
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            person_name: None,
            email_address: None,
            confirmation_hash: None,
            is_deleted: false,
            current_version: 0,
        }
    }
}

impl Projection for CustomerState {
    type Event = CustomerEvent;

    fn apply(&mut self, event: &CustomerEvent) {
        match &event.kind {
            CustomerEventKind::CustomerRegistered(registered) => {
                self.customer_id = registered.customer_id;
                self.person_name = Some(registered.person_name.clone());
                self.email_address = Some(CustomerEmailAddress::Unconfirmed(
                    UnconfirmedEmailAddress::rebuild(
                        registered.email_address.clone(),
                        registered.confirmation_hash.clone(),
                    ),
                ));
                self.confirmation_hash = Some(registered.confirmation_hash.clone());
            }
            CustomerEventKind::CustomerEmailAddressConfirmed(confirmed) => {
                self.email_address = Some(CustomerEmailAddress::Confirmed(
                    ConfirmedEmailAddress::rebuild(confirmed.email_address.clone()),
                ));
            }
            CustomerEventKind::CustomerEmailAddressConfirmationFailed(_) => {}
            CustomerEventKind::CustomerEmailAddressChanged(changed) => {
                self.email_address = Some(CustomerEmailAddress::Unconfirmed(
                    UnconfirmedEmailAddress::rebuild(
                        changed.email_address.clone(),
                        changed.confirmation_hash.clone(),
                    ),
                ));
                self.confirmation_hash = Some(changed.confirmation_hash.clone());
            }
            CustomerEventKind::CustomerNameChanged(changed) => {
                self.person_name = Some(changed.person_name.clone());
            }
            CustomerEventKind::CustomerDeleted(_) => {
                self.is_deleted = true;
            }
        }
        self.current_version = event.metadata().stream_version;
    }

    fn current_version(&self) -> i64 {
        self.current_version
    }
}
