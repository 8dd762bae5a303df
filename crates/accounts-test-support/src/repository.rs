//! Test event stores — `EventStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use accounts_core::error::DomainError;
use accounts_core::repository::{EventStore, StoredEvent, UniqueIndex, UniqueIndexAction};
use accounts_core::stream::StreamId;
use async_trait::async_trait;

type UniqueTables = HashMap<UniqueIndex, HashMap<String, String>>;

#[derive(Debug, Default)]
struct State {
    streams: HashMap<StreamId, Vec<StoredEvent>>,
    unique: UniqueTables,
}

/// An in-memory event store with the same guarantees the PostgreSQL store
/// gives: appends are atomic, a taken or skipped stream version is a
/// concurrency conflict, and side-table collisions are duplicates.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: Mutex<State>,
    append_calls: AtomicUsize,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `append` was invoked, including failed attempts.
    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of every event in `stream_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self, stream_id: &StreamId) -> Vec<StoredEvent> {
        self.state
            .lock()
            .unwrap()
            .streams
            .get(stream_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the `(key, owner)` rows of a side table, sorted by key.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn unique_entries(&self, index: UniqueIndex) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<(String, String)> = state
            .unique
            .get(&index)
            .map(|table| {
                table
                    .iter()
                    .map(|(key, owner)| (key.clone(), owner.clone()))
                    .collect()
            })
            .unwrap_or_default();
        rows.sort();
        rows
    }

    fn apply_unique_action(
        tables: &mut UniqueTables,
        action: &UniqueIndexAction,
    ) -> Result<(), DomainError> {
        match action {
            UniqueIndexAction::Add { index, key, owner } => {
                let table = tables.entry(*index).or_default();
                if table.contains_key(key) {
                    return Err(duplicate(*index, key));
                }
                table.insert(key.clone(), owner.clone());
            }
            UniqueIndexAction::Replace { index, key, owner } => {
                let table = tables.entry(*index).or_default();
                if table.get(key).is_some_and(|holder| holder != owner) {
                    return Err(duplicate(*index, key));
                }
                let previous = table
                    .iter()
                    .find(|(_, holder)| *holder == owner)
                    .map(|(previous_key, _)| previous_key.clone());
                if let Some(previous_key) = previous {
                    table.remove(&previous_key);
                    table.insert(key.clone(), owner.clone());
                }
            }
            UniqueIndexAction::Remove { index, owner } => {
                if let Some(table) = tables.get_mut(index) {
                    table.retain(|_, holder| holder != owner);
                }
            }
        }
        Ok(())
    }
}

fn duplicate(index: UniqueIndex, key: &str) -> DomainError {
    DomainError::Duplicate(format!("{key} is already taken in {index:?}"))
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn retrieve(
        &self,
        stream_id: &StreamId,
        from_version: i64,
        max_events: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .streams
            .get(stream_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|event| event.stream_version >= from_version)
                    .take(max_events)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn append(
        &self,
        stream_id: &StreamId,
        events: &[StoredEvent],
        unique_actions: &[UniqueIndexAction],
    ) -> Result<(), DomainError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if events.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock().unwrap();

        // Work on a copy so a failure leaves nothing behind.
        let mut unique = state.unique.clone();
        for action in unique_actions {
            Self::apply_unique_action(&mut unique, action)?;
        }

        let current = state.streams.get(stream_id).map_or(0, Vec::len);
        let mut expected = i64::try_from(current).unwrap_or(i64::MAX) + 1;
        for event in events {
            if event.stream_version != expected {
                return Err(DomainError::ConcurrencyConflict {
                    stream_id: stream_id.to_string(),
                    stream_version: event.stream_version,
                });
            }
            expected += 1;
        }

        state.unique = unique;
        state
            .streams
            .entry(stream_id.clone())
            .or_default()
            .extend(events.iter().cloned());
        Ok(())
    }

    async fn purge(&self, stream_id: &StreamId) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.streams.remove(stream_id);
        let owner = stream_id.aggregate_id();
        for table in state.unique.values_mut() {
            table.retain(|_, holder| holder != owner);
        }
        Ok(())
    }

    async fn find_owner(
        &self,
        index: UniqueIndex,
        key: &str,
    ) -> Result<Option<String>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .unique
            .get(&index)
            .and_then(|table| table.get(key))
            .cloned())
    }
}

/// Wraps an [`InMemoryEventStore`] and fails the next `n` appends with a
/// concurrency conflict before delegating. Counts every append call.
#[derive(Debug)]
pub struct ConflictingEventStore {
    inner: InMemoryEventStore,
    conflicts_remaining: AtomicU32,
}

impl ConflictingEventStore {
    /// Injects `conflicts` conflicts before appends start succeeding.
    #[must_use]
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryEventStore::new(),
            conflicts_remaining: AtomicU32::new(conflicts),
        }
    }

    /// Fails the next `conflicts` appends, replacing any pending count.
    pub fn inject_conflicts(&self, conflicts: u32) {
        self.conflicts_remaining.store(conflicts, Ordering::SeqCst);
    }

    /// The wrapped store, for seeding and inspection.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventStore {
        &self.inner
    }

    /// How many times `append` was invoked.
    pub fn append_calls(&self) -> usize {
        self.inner.append_calls()
    }
}

#[async_trait]
impl EventStore for ConflictingEventStore {
    async fn retrieve(
        &self,
        stream_id: &StreamId,
        from_version: i64,
        max_events: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.retrieve(stream_id, from_version, max_events).await
    }

    async fn append(
        &self,
        stream_id: &StreamId,
        events: &[StoredEvent],
        unique_actions: &[UniqueIndexAction],
    ) -> Result<(), DomainError> {
        let injected = self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            self.inner.append_calls.fetch_add(1, Ordering::SeqCst);
            return Err(DomainError::ConcurrencyConflict {
                stream_id: stream_id.to_string(),
                stream_version: events.first().map_or(0, |event| event.stream_version),
            });
        }
        self.inner.append(stream_id, events, unique_actions).await
    }

    async fn purge(&self, stream_id: &StreamId) -> Result<(), DomainError> {
        self.inner.purge(stream_id).await
    }

    async fn find_owner(
        &self,
        index: UniqueIndex,
        key: &str,
    ) -> Result<Option<String>, DomainError> {
        self.inner.find_owner(index, key).await
    }
}

/// An event store that always returns a technical error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

fn connection_refused() -> DomainError {
    DomainError::Technical("connection refused".into())
}

#[async_trait]
impl EventStore for FailingEventStore {
    async fn retrieve(
        &self,
        _stream_id: &StreamId,
        _from_version: i64,
        _max_events: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(connection_refused())
    }

    async fn append(
        &self,
        _stream_id: &StreamId,
        _events: &[StoredEvent],
        _unique_actions: &[UniqueIndexAction],
    ) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn purge(&self, _stream_id: &StreamId) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn find_owner(
        &self,
        _index: UniqueIndex,
        _key: &str,
    ) -> Result<Option<String>, DomainError> {
        Err(connection_refused())
    }
}
