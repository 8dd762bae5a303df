//! Customer event serialization.
//!
//! Each event is stored as a JSON document `{"meta": ..., "payload": ...}`
//! and dispatched back to its payload type by event name.

use accounts_core::error::DomainError;
use accounts_core::event::{DomainEvent, EventMetadata};
use accounts_core::repository::StoredEvent;
use accounts_core::stream::StreamId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::events::{
    CUSTOMER_DELETED, CUSTOMER_EMAIL_ADDRESS_CHANGED, CUSTOMER_EMAIL_ADDRESS_CONFIRMATION_FAILED,
    CUSTOMER_EMAIL_ADDRESS_CONFIRMED, CUSTOMER_NAME_CHANGED, CUSTOMER_REGISTERED, CustomerEvent,
    CustomerEventKind,
};

#[derive(Serialize)]
struct RecordRef<'a, P> {
    meta: &'a EventMetadata,
    payload: &'a P,
}

#[derive(Deserialize)]
struct Record<P> {
    meta: EventMetadata,
    payload: P,
}

fn marshal<P: Serialize>(meta: &EventMetadata, payload: &P) -> Result<Vec<u8>, DomainError> {
    serde_json::to_vec(&RecordRef { meta, payload }).map_err(|e| {
        DomainError::MarshalingFailed(format!("{}: {e}", meta.event_name))
    })
}

fn unmarshal<P: DeserializeOwned>(
    event_name: &str,
    payload: &[u8],
    wrap: fn(P) -> CustomerEventKind,
) -> Result<CustomerEvent, DomainError> {
    let record: Record<P> = serde_json::from_slice(payload)
        .map_err(|e| DomainError::UnmarshalingFailed(format!("{event_name}: {e}")))?;
    if record.meta.event_name != event_name {
        return Err(DomainError::UnmarshalingFailed(format!(
            "record for {} stored as {event_name}",
            record.meta.event_name
        )));
    }
    Ok(CustomerEvent {
        metadata: record.meta,
        kind: wrap(record.payload),
    })
}

/// Serializes `event` to its self-describing byte payload.
///
/// # Errors
///
/// Returns `DomainError::MarshalingFailed` if the metadata names a different
/// event than the payload, or JSON encoding fails.
pub fn marshal_customer_event(event: &CustomerEvent) -> Result<Vec<u8>, DomainError> {
    let meta = event.metadata();
    if meta.event_name != event.event_name() {
        return Err(DomainError::MarshalingFailed(format!(
            "metadata names {} but payload is {}",
            meta.event_name,
            event.event_name()
        )));
    }
    match &event.kind {
        CustomerEventKind::CustomerRegistered(p) => marshal(meta, p),
        CustomerEventKind::CustomerEmailAddressConfirmed(p) => marshal(meta, p),
        CustomerEventKind::CustomerEmailAddressConfirmationFailed(p) => marshal(meta, p),
        CustomerEventKind::CustomerEmailAddressChanged(p) => marshal(meta, p),
        CustomerEventKind::CustomerNameChanged(p) => marshal(meta, p),
        CustomerEventKind::CustomerDeleted(p) => marshal(meta, p),
    }
}

/// Rebuilds a customer event from its name and byte payload.
///
/// # Errors
///
/// Returns `DomainError::UnmarshalingFailed` for an unknown event name or a
/// payload that does not decode.
pub fn unmarshal_customer_event(
    event_name: &str,
    payload: &[u8],
) -> Result<CustomerEvent, DomainError> {
    match event_name {
        CUSTOMER_REGISTERED => {
            unmarshal(event_name, payload, CustomerEventKind::CustomerRegistered)
        }
        CUSTOMER_EMAIL_ADDRESS_CONFIRMED => unmarshal(
            event_name,
            payload,
            CustomerEventKind::CustomerEmailAddressConfirmed,
        ),
        CUSTOMER_EMAIL_ADDRESS_CONFIRMATION_FAILED => unmarshal(
            event_name,
            payload,
            CustomerEventKind::CustomerEmailAddressConfirmationFailed,
        ),
        CUSTOMER_EMAIL_ADDRESS_CHANGED => unmarshal(
            event_name,
            payload,
            CustomerEventKind::CustomerEmailAddressChanged,
        ),
        CUSTOMER_NAME_CHANGED => {
            unmarshal(event_name, payload, CustomerEventKind::CustomerNameChanged)
        }
        CUSTOMER_DELETED => unmarshal(event_name, payload, CustomerEventKind::CustomerDeleted),
        unknown => Err(DomainError::UnmarshalingFailed(format!(
            "unknown customer event {unknown:?}"
        ))),
    }
}

/// Converts a recorded event into the row the store appends.
///
/// # Errors
///
/// Propagates `DomainError::MarshalingFailed`.
pub fn to_stored_event(
    stream_id: &StreamId,
    event: &CustomerEvent,
) -> Result<StoredEvent, DomainError> {
    let meta = event.metadata();
    Ok(StoredEvent {
        stream_id: stream_id.clone(),
        stream_version: meta.stream_version,
        event_name: meta.event_name.clone(),
        occurred_at: meta.occurred_at,
        payload: marshal_customer_event(event)?,
    })
}

/// Converts a stored row back into a customer event.
///
/// # Errors
///
/// Propagates `DomainError::UnmarshalingFailed`.
pub fn from_stored_event(stored: &StoredEvent) -> Result<CustomerEvent, DomainError> {
    unmarshal_customer_event(&stored.event_name, &stored.payload)
}

#[cfg(test)]
mod tests {
    use accounts_core::email::EmailAddress;
    use accounts_core::error::ErrorKind;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::events::{
        CustomerDeleted, CustomerEmailAddressChanged, CustomerEmailAddressConfirmationFailed,
        CustomerEmailAddressConfirmed, CustomerNameChanged, CustomerRegistered,
    };
    use crate::domain::values::{ConfirmationHash, CustomerId, PersonName};

    fn every_event() -> Vec<CustomerEvent> {
        let customer_id = CustomerId::generate();
        let fiona = EmailAddress::rebuild("fiona@gallagher.net");
        let kinds = vec![
            CustomerEventKind::CustomerRegistered(CustomerRegistered {
                customer_id,
                email_address: fiona.clone(),
                confirmation_hash: ConfirmationHash::rebuild("h1"),
                person_name: PersonName::rebuild("Fiona", "Gallagher"),
            }),
            CustomerEventKind::CustomerEmailAddressConfirmed(CustomerEmailAddressConfirmed {
                customer_id,
                email_address: fiona.clone(),
            }),
            CustomerEventKind::CustomerEmailAddressConfirmationFailed(
                CustomerEmailAddressConfirmationFailed {
                    customer_id,
                    confirmation_hash: ConfirmationHash::rebuild("invalid"),
                    reason: "confirmation hash does not match".to_owned(),
                },
            ),
            CustomerEventKind::CustomerEmailAddressChanged(CustomerEmailAddressChanged {
                customer_id,
                email_address: EmailAddress::rebuild("fiona@work.net"),
                confirmation_hash: ConfirmationHash::rebuild("h2"),
                previous_email_address: fiona,
            }),
            CustomerEventKind::CustomerNameChanged(CustomerNameChanged {
                customer_id,
                person_name: PersonName::rebuild("Fiona", "Shameless"),
            }),
            CustomerEventKind::CustomerDeleted(CustomerDeleted { customer_id }),
        ];
        kinds
            .into_iter()
            .zip(1..)
            .map(|(kind, version)| CustomerEvent {
                metadata: EventMetadata::new(
                    kind.event_name(),
                    Utc.timestamp_opt(1_768_471_200, 123_456_789).unwrap(),
                    Uuid::new_v4(),
                    version,
                ),
                kind,
            })
            .collect()
    }

    #[test]
    fn test_every_event_survives_stored_round_trip() {
        let customer_id = CustomerId::generate();
        let stream_id = customer_id.stream_id();

        for event in every_event() {
            let stored = to_stored_event(&stream_id, &event).unwrap();
            let restored = from_stored_event(&stored).unwrap();

            assert_eq!(stored.event_name, event.event_name());
            assert_eq!(restored, event);
        }
    }

    #[test]
    fn test_failure_event_round_trip_keeps_its_reason_kind() {
        let failed = every_event().swap_remove(2);

        let bytes = marshal_customer_event(&failed).unwrap();
        let restored = unmarshal_customer_event(&failed.metadata.event_name, &bytes).unwrap();

        let reason = restored.failure_reason().unwrap();
        assert_eq!(reason.kind(), ErrorKind::DomainConstraintsViolation);
        assert!(reason.to_string().contains("confirmation hash does not match"));
    }

    #[test]
    fn test_payload_uses_camel_case_meta_and_nanosecond_timestamp() {
        let registered = every_event().swap_remove(0);

        let bytes = marshal_customer_event(&registered).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["meta"]["eventName"], "CustomerRegistered");
        assert_eq!(json["meta"]["occurredAt"], "2026-01-15T10:00:00.123456789Z");
        assert_eq!(json["meta"]["streamVersion"], 1);
        assert_eq!(json["payload"]["emailAddress"], "fiona@gallagher.net");
        assert_eq!(json["payload"]["personName"]["givenName"], "Fiona");
    }

    #[test]
    fn test_unknown_event_name_fails_to_unmarshal() {
        let err = unmarshal_customer_event("CustomerTeleported", b"{}").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnmarshalingFailed);
    }

    #[test]
    fn test_corrupt_payload_fails_to_unmarshal() {
        let err = unmarshal_customer_event(CUSTOMER_DELETED, b"not json").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnmarshalingFailed);
    }

    #[test]
    fn test_mismatched_metadata_name_fails_to_marshal() {
        let mut event = every_event().swap_remove(5);
        event.metadata.event_name = CUSTOMER_REGISTERED.to_owned();

        let err = marshal_customer_event(&event).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MarshalingFailed);
    }
}
