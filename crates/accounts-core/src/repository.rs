//! Event store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::stream::StreamId;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Stream this event belongs to.
    pub stream_id: StreamId,
    /// Position within the stream, starting at 1.
    pub stream_version: i64,
    /// Event type name for deserialization routing.
    pub event_name: String,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
    /// Self-describing serialized event, metadata included.
    pub payload: Vec<u8>,
}

/// Side tables that enforce cross-aggregate uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueIndex {
    /// `unique_email_addresses`: email address to customer id.
    CustomerEmailAddress,
    /// `unique_identities`: email address to identity id.
    IdentityEmailAddress,
}

/// One mutation of a uniqueness side table, applied in the append transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueIndexAction {
    /// Claim `key` for `owner`.
    Add {
        /// Target side table.
        index: UniqueIndex,
        /// The unique value.
        key: String,
        /// Aggregate id that owns the value.
        owner: String,
    },
    /// Move `owner`'s row to `key`.
    Replace {
        /// Target side table.
        index: UniqueIndex,
        /// The new unique value.
        key: String,
        /// Aggregate id that owns the value.
        owner: String,
    },
    /// Release whatever `owner` holds.
    Remove {
        /// Target side table.
        index: UniqueIndex,
        /// Aggregate id whose row is dropped.
        owner: String,
    },
}

/// Store for versioned event streams and their uniqueness side tables.
///
/// Implementations must reject a second event at an existing
/// `(stream_id, stream_version)` with `DomainError::ConcurrencyConflict` and a
/// side-table collision with `DomainError::Duplicate`. Any other failure is
/// `DomainError::Technical`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load up to `max_events` events with `stream_version >= from_version`,
    /// ordered by version.
    async fn retrieve(
        &self,
        stream_id: &StreamId,
        from_version: i64,
        max_events: usize,
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Atomically apply `unique_actions`, then append `events`. Each event
    /// carries its intended `stream_version`. Appending nothing is a no-op.
    async fn append(
        &self,
        stream_id: &StreamId,
        events: &[StoredEvent],
        unique_actions: &[UniqueIndexAction],
    ) -> Result<(), DomainError>;

    /// Delete the stream and any side-table rows owned by its aggregate.
    async fn purge(&self, stream_id: &StreamId) -> Result<(), DomainError>;

    /// Look up the aggregate id that currently owns `key` in `index`.
    /// The answer may be stale by one concurrent write.
    async fn find_owner(&self, index: UniqueIndex, key: &str)
    -> Result<Option<String>, DomainError>;
}
