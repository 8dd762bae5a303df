//! Query handlers for the Customer context.

use accounts_core::error::DomainError;
use accounts_core::repository::EventStore;
use serde::Serialize;
use tracing::instrument;

use crate::application::command_handlers::load_customer;
use crate::domain::values::CustomerId;

/// Read-side view of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerView {
    pub customer_id: String,
    pub email_address: String,
    pub is_email_address_confirmed: bool,
    pub given_name: String,
    pub family_name: String,
    /// Stream version the view was projected at.
    pub version: i64,
}

/// Replays the customer's stream into a [`CustomerView`]. Never retries.
///
/// # Errors
///
/// Returns `DomainError::InputInvalid` for a malformed id,
/// `DomainError::NotFound` for a missing or deleted customer, or any store
/// error.
#[instrument(skip(store))]
pub async fn get_customer_view_by_id(
    customer_id: &str,
    store: &dyn EventStore,
) -> Result<CustomerView, DomainError> {
    let customer_id = CustomerId::build(customer_id)?;
    let state = load_customer(customer_id, &customer_id.stream_id(), store).await?;
    if state.is_deleted {
        return Err(DomainError::NotFound(format!("customer {customer_id} is deleted")));
    }

    let (Some(email_address), Some(person_name)) = (&state.email_address, &state.person_name)
    else {
        return Err(DomainError::UnmarshalingFailed(format!(
            "customer {customer_id} stream does not start with CustomerRegistered"
        )));
    };

    Ok(CustomerView {
        customer_id: customer_id.to_string(),
        email_address: email_address.as_str().to_owned(),
        is_email_address_confirmed: email_address.is_confirmed(),
        given_name: person_name.given_name().to_owned(),
        family_name: person_name.family_name().to_owned(),
        version: state.current_version,
    })
}
