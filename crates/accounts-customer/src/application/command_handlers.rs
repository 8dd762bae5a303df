//! Command handlers for the Customer context.
//!
//! Every handler runs load stream, replay, decide and append inside
//! [`retry_on_concurrency_conflict`]. Uniqueness index actions derived from
//! the recorded events are applied in the same append.

use accounts_core::aggregate::Projection;
use accounts_core::command::Command;
use accounts_core::error::{DomainError, ErrorKind, ResultExt};
use accounts_core::event::DomainEvent;
use accounts_core::repository::EventStore;
use accounts_core::retry::retry_on_concurrency_conflict;
use accounts_core::stream::StreamId;
use accounts_core::time::Clock;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::application::serialization::{from_stored_event, to_stored_event};
use crate::application::unique_email_addresses::unique_email_address_actions;
use crate::domain::aggregates::CustomerState;
use crate::domain::commands::{
    ChangeCustomerEmailAddress, ChangeCustomerName, ConfirmCustomerEmailAddress, DeleteCustomer,
    RegisterCustomer,
};
use crate::domain::decisions;
use crate::domain::events::CustomerEvent;
use crate::domain::values::CustomerId;

/// Loads and replays the full stream of `customer_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the stream is empty, or any load or
/// unmarshaling error.
pub(crate) async fn load_customer(
    customer_id: CustomerId,
    stream_id: &StreamId,
    store: &dyn EventStore,
) -> Result<CustomerState, DomainError> {
    let stored = store
        .retrieve(stream_id, 1, usize::MAX)
        .await
        .context("load customer stream")?;
    if stored.is_empty() {
        return Err(DomainError::NotFound(format!("customer {customer_id}")));
    }
    debug!(count = stored.len(), "loaded customer events");

    let events = stored
        .iter()
        .map(from_stored_event)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CustomerState::new(customer_id).replay(&events))
}

async fn record(
    stream_id: &StreamId,
    recorded: &[CustomerEvent],
    store: &dyn EventStore,
) -> Result<(), DomainError> {
    let stored = recorded
        .iter()
        .map(|event| to_stored_event(stream_id, event))
        .collect::<Result<Vec<_>, _>>()?;
    let actions = unique_email_address_actions(recorded);
    store
        .append(stream_id, &stored, &actions)
        .await
        .context("append customer events")
}

async fn execute<C, D>(
    customer_id: CustomerId,
    command: &C,
    decide: D,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<(), DomainError>
where
    C: Command,
    D: Fn(&CustomerState, &C, DateTime<Utc>) -> Result<Vec<CustomerEvent>, DomainError> + Sync,
{
    let stream_id = customer_id.stream_id();
    let stream_id = &stream_id;
    let decide = &decide;

    retry_on_concurrency_conflict(max_retries, move || async move {
        let state = load_customer(customer_id, stream_id, store).await?;
        let recorded = decide(&state, command, clock.now())?;
        if recorded.is_empty() {
            debug!(
                command = command.command_name(),
                stream_version = state.current_version,
                "nothing to record"
            );
            return Ok(());
        }

        record(stream_id, &recorded, store).await?;

        match recorded.iter().find_map(DomainEvent::failure_reason) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    })
    .await
    .context(command.command_name())
}

/// Handles `RegisterCustomer`: starts the customer's stream and claims the
/// email address.
///
/// # Errors
///
/// Returns `DomainError::Duplicate` if the address is taken or the stream
/// already exists, or any store error.
#[instrument(skip(clock, store), fields(customer_id = %command.customer_id))]
pub async fn handle_register_customer(
    command: &RegisterCustomer,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<CustomerId, DomainError> {
    let stream_id = command.customer_id.stream_id();
    let stream_id = &stream_id;

    retry_on_concurrency_conflict(max_retries, move || async move {
        let recorded = [decisions::register(command, clock.now())];
        record(stream_id, &recorded, store).await.map_err(|err| {
            if err.is(ErrorKind::ConcurrencyConflict) {
                DomainError::Duplicate("found duplicate customer".into())
            } else {
                err
            }
        })
    })
    .await
    .context(command.command_name())?;

    info!("customer registered");
    Ok(command.customer_id)
}

/// Handles `ConfirmCustomerEmailAddress`.
///
/// # Errors
///
/// Returns `DomainError::DomainConstraintsViolation` after recording a failed
/// confirmation, `DomainError::NotFound` for a missing or deleted customer,
/// or any store error.
#[instrument(skip(clock, store), fields(customer_id = %command.customer_id))]
pub async fn handle_confirm_customer_email_address(
    command: &ConfirmCustomerEmailAddress,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<(), DomainError> {
    execute(
        command.customer_id,
        command,
        decisions::confirm_email_address,
        clock,
        store,
        max_retries,
    )
    .await
}

/// Handles `ChangeCustomerEmailAddress`.
///
/// # Errors
///
/// Returns `DomainError::Duplicate` if another customer holds the address,
/// `DomainError::NotFound` for a missing or deleted customer, or any store
/// error.
#[instrument(skip(clock, store), fields(customer_id = %command.customer_id))]
pub async fn handle_change_customer_email_address(
    command: &ChangeCustomerEmailAddress,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<(), DomainError> {
    execute(
        command.customer_id,
        command,
        decisions::change_email_address,
        clock,
        store,
        max_retries,
    )
    .await
}

/// Handles `ChangeCustomerName`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for a missing or deleted customer, or any
/// store error.
#[instrument(skip(clock, store), fields(customer_id = %command.customer_id))]
pub async fn handle_change_customer_name(
    command: &ChangeCustomerName,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<(), DomainError> {
    execute(
        command.customer_id,
        command,
        decisions::change_name,
        clock,
        store,
        max_retries,
    )
    .await
}

/// Handles `DeleteCustomer`. Deleting a deleted customer succeeds silently.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for a customer that never existed, or any
/// store error.
#[instrument(skip(clock, store), fields(customer_id = %command.customer_id))]
pub async fn handle_delete_customer(
    command: &DeleteCustomer,
    clock: &dyn Clock,
    store: &dyn EventStore,
    max_retries: u32,
) -> Result<(), DomainError> {
    execute(
        command.customer_id,
        command,
        decisions::delete,
        clock,
        store,
        max_retries,
    )
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use accounts_core::repository::UniqueIndex;
    use accounts_core::retry::DEFAULT_MAX_RETRIES;
    use accounts_test_support::{
        ConflictingEventStore, FailingEventStore, FixedClock, InMemoryEventStore,
    };

    use super::*;
    use crate::application::query_handlers::get_customer_view_by_id;

    const FIONA: &str = "fiona@gallagher.net";

    async fn register(store: &dyn EventStore, email: &str) -> (CustomerId, String) {
        let command = RegisterCustomer::build(email, "Fiona", "Gallagher").unwrap();
        let hash = command.email_address.confirmation_hash().as_str().to_owned();
        let id = handle_register_customer(
            &command,
            &FixedClock::january_15th(),
            store,
            DEFAULT_MAX_RETRIES,
        )
        .await
        .unwrap();
        (id, hash)
    }

    async fn confirm(store: &dyn EventStore, id: CustomerId, hash: &str) -> Result<(), DomainError> {
        let command = ConfirmCustomerEmailAddress::build(&id.to_string(), hash).unwrap();
        handle_confirm_customer_email_address(
            &command,
            &FixedClock::january_15th(),
            store,
            DEFAULT_MAX_RETRIES,
        )
        .await
    }

    async fn change_email(
        store: &dyn EventStore,
        id: CustomerId,
        email: &str,
    ) -> Result<String, DomainError> {
        let command = ChangeCustomerEmailAddress::build(&id.to_string(), email).unwrap();
        handle_change_customer_email_address(
            &command,
            &FixedClock::january_15th(),
            store,
            DEFAULT_MAX_RETRIES,
        )
        .await?;
        Ok(command.email_address.confirmation_hash().as_str().to_owned())
    }

    async fn change_name(store: &dyn EventStore, id: CustomerId) -> Result<(), DomainError> {
        let command = ChangeCustomerName::build(&id.to_string(), "Lip", "Gallagher").unwrap();
        handle_change_customer_name(
            &command,
            &FixedClock::january_15th(),
            store,
            DEFAULT_MAX_RETRIES,
        )
        .await
    }

    async fn delete(store: &dyn EventStore, id: CustomerId) -> Result<(), DomainError> {
        let command = DeleteCustomer::build(&id.to_string()).unwrap();
        handle_delete_customer(
            &command,
            &FixedClock::january_15th(),
            store,
            DEFAULT_MAX_RETRIES,
        )
        .await
    }

    #[tokio::test]
    async fn test_register_then_view() {
        // Arrange
        let store = InMemoryEventStore::new();

        // Act
        let (id, _) = register(&store, FIONA).await;

        // Assert
        let view = get_customer_view_by_id(&id.to_string(), &store).await.unwrap();
        assert_eq!(view.customer_id, id.to_string());
        assert_eq!(view.email_address, FIONA);
        assert!(!view.is_email_address_confirmed);
        assert_eq!(view.given_name, "Fiona");
        assert_eq!(view.family_name, "Gallagher");
        assert_eq!(view.version, 1);
        assert_eq!(
            store.unique_entries(UniqueIndex::CustomerEmailAddress),
            vec![(FIONA.to_owned(), id.to_string())]
        );
    }

    #[tokio::test]
    async fn test_register_persists_event_at_fixed_clock_time() {
        let store = InMemoryEventStore::new();

        let (id, _) = register(&store, FIONA).await;

        let events = store.events(&id.stream_id());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "CustomerRegistered");
        assert_eq!(events[0].occurred_at, FixedClock::january_15th().0);
    }

    #[tokio::test]
    async fn test_register_with_taken_email_is_duplicate() {
        let store = InMemoryEventStore::new();
        register(&store, FIONA).await;
        let command = RegisterCustomer::build(FIONA, "Fiona", "Gallagher").unwrap();

        let err = handle_register_customer(
            &command,
            &FixedClock::january_15th(),
            &store,
            DEFAULT_MAX_RETRIES,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert!(store.events(&command.customer_id.stream_id()).is_empty());
    }

    #[tokio::test]
    async fn test_register_against_existing_stream_is_duplicate_without_retry() {
        // Arrange
        let store = InMemoryEventStore::new();
        let command = RegisterCustomer::build(FIONA, "Fiona", "Gallagher").unwrap();
        let clock = FixedClock::january_15th();
        handle_register_customer(&command, &clock, &store, DEFAULT_MAX_RETRIES)
            .await
            .unwrap();
        let mut replay = command.clone();
        replay.email_address =
            crate::domain::values::UnconfirmedEmailAddress::build("lip@gallagher.net").unwrap();

        // Act
        let err = handle_register_customer(&replay, &clock, &store, DEFAULT_MAX_RETRIES)
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert!(err.to_string().contains("found duplicate customer"));
        assert_eq!(store.append_calls(), 2);
        assert!(
            store
                .find_owner(UniqueIndex::CustomerEmailAddress, "lip@gallagher.net")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_confirm_then_change_then_confirm_again() {
        // Arrange
        let store = InMemoryEventStore::new();
        let (id, hash) = register(&store, FIONA).await;

        // Act
        confirm(&store, id, &hash).await.unwrap();
        let new_hash = change_email(&store, id, "fiona@work.net").await.unwrap();
        let after_change = get_customer_view_by_id(&id.to_string(), &store).await.unwrap();
        confirm(&store, id, &new_hash).await.unwrap();
        let after_confirm = get_customer_view_by_id(&id.to_string(), &store).await.unwrap();

        // Assert
        assert_eq!(after_change.email_address, "fiona@work.net");
        assert!(!after_change.is_email_address_confirmed);
        assert_eq!(after_change.version, 3);
        assert!(after_confirm.is_email_address_confirmed);
        assert_eq!(after_confirm.version, 4);
        assert_eq!(
            store.unique_entries(UniqueIndex::CustomerEmailAddress),
            vec![("fiona@work.net".to_owned(), id.to_string())]
        );
    }

    #[tokio::test]
    async fn test_wrong_confirmation_hash_is_recorded_and_reported() {
        // Arrange
        let store = InMemoryEventStore::new();
        let (id, _) = register(&store, FIONA).await;

        // Act
        let err = confirm(&store, id, "invalid").await.unwrap_err();

        // Assert
        assert_eq!(err.kind(), ErrorKind::DomainConstraintsViolation);
        let view = get_customer_view_by_id(&id.to_string(), &store).await.unwrap();
        assert!(!view.is_email_address_confirmed);
        assert_eq!(view.version, 2);
        let events = store.events(&id.stream_id());
        assert_eq!(events[1].event_name, "CustomerEmailAddressConfirmationFailed");
    }

    #[tokio::test]
    async fn test_redundant_commands_record_nothing() {
        let store = InMemoryEventStore::new();
        let (id, hash) = register(&store, FIONA).await;
        confirm(&store, id, &hash).await.unwrap();
        change_name(&store, id).await.unwrap();

        confirm(&store, id, &hash).await.unwrap();
        change_email(&store, id, FIONA).await.unwrap();
        change_name(&store, id).await.unwrap();

        assert_eq!(store.events(&id.stream_id()).len(), 3);
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        // Arrange
        let store = InMemoryEventStore::new();
        let (id, hash) = register(&store, FIONA).await;

        // Act
        delete(&store, id).await.unwrap();

        // Assert
        let view = get_customer_view_by_id(&id.to_string(), &store).await;
        assert_eq!(view.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(confirm(&store, id, &hash).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            change_email(&store, id, "fiona@work.net").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(change_name(&store, id).await.unwrap_err().kind(), ErrorKind::NotFound);
        delete(&store, id).await.unwrap();
        assert_eq!(store.events(&id.stream_id()).len(), 2);
        assert!(store.unique_entries(UniqueIndex::CustomerEmailAddress).is_empty());
    }

    #[tokio::test]
    async fn test_email_can_be_reused_after_original_customer_is_deleted() {
        let store = InMemoryEventStore::new();
        let (first, _) = register(&store, FIONA).await;
        delete(&store, first).await.unwrap();

        let (second, _) = register(&store, FIONA).await;

        assert_ne!(first, second);
        assert_eq!(
            store.unique_entries(UniqueIndex::CustomerEmailAddress),
            vec![(FIONA.to_owned(), second.to_string())]
        );
    }

    #[tokio::test]
    async fn test_change_to_email_of_other_customer_is_duplicate() {
        let store = InMemoryEventStore::new();
        register(&store, FIONA).await;
        let (lip, _) = register(&store, "lip@gallagher.net").await;

        let err = change_email(&store, lip, FIONA).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(store.events(&lip.stream_id()).len(), 1);
    }

    #[tokio::test]
    async fn test_commands_on_unknown_customer_are_not_found() {
        let store = InMemoryEventStore::new();
        let id = CustomerId::generate();

        assert_eq!(confirm(&store, id, "hash").await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(change_name(&store, id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(delete(&store, id).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.append_calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_conflicts_are_retried() {
        // Arrange
        let store = ConflictingEventStore::new(0);
        let (id, _) = register(&store, FIONA).await;
        store.inject_conflicts(3);
        let calls_before = store.append_calls();

        // Act
        change_name(&store, id).await.unwrap();

        // Assert
        assert_eq!(store.append_calls() - calls_before, 4);
        assert_eq!(store.inner().events(&id.stream_id()).len(), 2);
    }

    #[tokio::test]
    async fn test_append_attempts_are_bounded_by_max_retries() {
        // Arrange
        let store = ConflictingEventStore::new(0);
        let (id, _) = register(&store, FIONA).await;
        store.inject_conflicts(u32::MAX);
        let calls_before = store.append_calls();
        let command = ChangeCustomerName::build(&id.to_string(), "Lip", "Gallagher").unwrap();

        // Act
        let err = handle_change_customer_name(&command, &FixedClock::january_15th(), &store, 10)
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.kind(), ErrorKind::MaxRetriesExceeded);
        assert_eq!(store.append_calls() - calls_before, 10);
        assert_eq!(store.inner().events(&id.stream_id()).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_with_same_email_admit_exactly_one() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let clock = FixedClock::january_15th();

        // Act
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let command = RegisterCustomer::build(FIONA, "Fiona", "Gallagher").unwrap();
                    handle_register_customer(&command, &clock, store.as_ref(), DEFAULT_MAX_RETRIES)
                        .await
                })
            })
            .collect();
        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) if err.is(ErrorKind::Duplicate) => duplicates += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }

        // Assert
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.unique_entries(UniqueIndex::CustomerEmailAddress).len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_technical() {
        let command = RegisterCustomer::build(FIONA, "Fiona", "Gallagher").unwrap();

        let err = handle_register_customer(
            &command,
            &FixedClock::january_15th(),
            &FailingEventStore,
            DEFAULT_MAX_RETRIES,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Technical);
        assert!(err.to_string().starts_with("RegisterCustomer: "));
    }
}
