//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// Unqualified event type name; round-trips verbatim.
    pub event_name: String,
    /// When the event was recorded. Informational only.
    #[serde(with = "crate::time::rfc3339_nanos")]
    pub occurred_at: DateTime<Utc>,
    /// Globally unique id of this event.
    pub message_id: Uuid,
    /// Id of the command that produced this event.
    pub causation_id: Uuid,
    /// Position within the stream, starting at 1.
    pub stream_version: i64,
}

impl EventMetadata {
    /// Creates metadata for a freshly recorded event.
    #[must_use]
    pub fn new(
        event_name: &str,
        occurred_at: DateTime<Utc>,
        causation_id: Uuid,
        stream_version: i64,
    ) -> Self {
        Self {
            event_name: event_name.to_owned(),
            occurred_at,
            message_id: Uuid::new_v4(),
            causation_id,
            stream_version,
        }
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_name(&self) -> &'static str;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Whether this event records a rejected command attempt.
    fn is_failure(&self) -> bool {
        false
    }

    /// The rejection carried by a failure event.
    fn failure_reason(&self) -> Option<DomainError> {
        None
    }
}
