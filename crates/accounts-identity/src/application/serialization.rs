//! Identity event serialization: `{"meta": ..., "payload": ...}` JSON records
//! dispatched by event name.

use accounts_core::error::DomainError;
use accounts_core::event::{DomainEvent, EventMetadata};
use accounts_core::repository::StoredEvent;
use accounts_core::stream::StreamId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::events::{IDENTITY_DELETED, IDENTITY_REGISTERED, IdentityEvent, IdentityEventKind};

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
    serde_json::to_vec(&RecordRef { meta, payload })
        .map_err(|e| DomainError::MarshalingFailed(format!("{}: {e}", meta.event_name)))
}

fn unmarshal<P: DeserializeOwned>(
    event_name: &str,
    payload: &[u8],
    wrap: fn(P) -> IdentityEventKind,
) -> Result<IdentityEvent, DomainError> {
    let record: Record<P> = serde_json::from_slice(payload)
        .map_err(|e| DomainError::UnmarshalingFailed(format!("{event_name}: {e}")))?;
    if record.meta.event_name != event_name {
        return Err(DomainError::UnmarshalingFailed(format!(
            "record for {} stored as {event_name}",
            record.meta.event_name
        )));
    }
    Ok(IdentityEvent {
        metadata: record.meta,
        kind: wrap(record.payload),
    })
}

/// # Errors
///
/// Returns `DomainError::MarshalingFailed` if the metadata names a different
/// event than the payload, or JSON encoding fails.
pub fn marshal_identity_event(event: &IdentityEvent) -> Result<Vec<u8>, DomainError> {
    let meta = event.metadata();
    if meta.event_name != event.event_name() {
        return Err(DomainError::MarshalingFailed(format!(
            "metadata names {} but payload is {}",
            meta.event_name,
            event.event_name()
        )));
    }
    match &event.kind {
        IdentityEventKind::IdentityRegistered(p) => marshal(meta, p),
        IdentityEventKind::IdentityDeleted(p) => marshal(meta, p),
    }
}

/// # Errors
///
/// Returns `DomainError::UnmarshalingFailed` for an unknown event name or a
/// payload that does not decode.
pub fn unmarshal_identity_event(
    event_name: &str,
    payload: &[u8],
) -> Result<IdentityEvent, DomainError> {
    match event_name {
        IDENTITY_REGISTERED => {
            unmarshal(event_name, payload, IdentityEventKind::IdentityRegistered)
        }
        IDENTITY_DELETED => unmarshal(event_name, payload, IdentityEventKind::IdentityDeleted),
        unknown => Err(DomainError::UnmarshalingFailed(format!(
            "unknown identity event {unknown:?}"
        ))),
    }
}

/// # Errors
///
/// Propagates `DomainError::MarshalingFailed`.
pub fn to_stored_event(
    stream_id: &StreamId,
    event: &IdentityEvent,
) -> Result<StoredEvent, DomainError> {
    let meta = event.metadata();
    Ok(StoredEvent {
        stream_id: stream_id.clone(),
        stream_version: meta.stream_version,
        event_name: meta.event_name.clone(),
        occurred_at: meta.occurred_at,
        payload: marshal_identity_event(event)?,
    })
}

/// # Errors
///
/// Propagates `DomainError::UnmarshalingFailed`.
pub fn from_stored_event(stored: &StoredEvent) -> Result<IdentityEvent, DomainError> {
    unmarshal_identity_event(&stored.event_name, &stored.payload)
}
