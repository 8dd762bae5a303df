//! `PostgreSQL` implementation of the `EventStore` trait.

use accounts_core::error::DomainError;
use accounts_core::repository::{EventStore, StoredEvent, UniqueIndex, UniqueIndexAction};
use accounts_core::stream::StreamId;
use accounts_core::time::{format_occurred_at, parse_occurred_at};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info, instrument};

use crate::schema::{
    DELETE_STREAM, EVENTS_STREAM_VERSION_CONSTRAINT, INSERT_EVENT, SELECT_MAX_STREAM_VERSION,
    SELECT_STREAM, SIDE_TABLES, side_table,
};

/// PostgreSQL-backed event store.
///
/// One `append` is one transaction: side-table actions first, then the version
/// check and the event inserts. Dropping the future before commit rolls the
/// transaction back.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| technical("begin transaction", &e))
    }

    async fn apply_unique_action(
        tx: &mut Transaction<'static, Postgres>,
        action: &UniqueIndexAction,
    ) -> Result<(), DomainError> {
        let result = match action {
            UniqueIndexAction::Add { index, key, owner } => {
                sqlx::query(side_table(*index).insert)
                    .bind(key)
                    .bind(owner)
                    .execute(&mut **tx)
                    .await
            }
            UniqueIndexAction::Replace { index, key, owner } => {
                sqlx::query(side_table(*index).replace)
                    .bind(key)
                    .bind(owner)
                    .execute(&mut **tx)
                    .await
            }
            UniqueIndexAction::Remove { index, owner } => {
                sqlx::query(side_table(*index).remove)
                    .bind(owner)
                    .execute(&mut **tx)
                    .await
            }
        };
        result.map(|_| ()).map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Duplicate(format!(
                    "{} rejected {action:?}",
                    side_table(action_index(action)).name
                ))
            } else {
                technical("apply unique index action", &e)
            }
        })
    }
}

const fn action_index(action: &UniqueIndexAction) -> UniqueIndex {
    match action {
        UniqueIndexAction::Add { index, .. }
        | UniqueIndexAction::Replace { index, .. }
        | UniqueIndexAction::Remove { index, .. } => *index,
    }
}

fn technical(operation: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Technical(format!("{operation}: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_stream_version_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                && db.constraint() == Some(EVENTS_STREAM_VERSION_CONSTRAINT)
    )
}

fn concurrency_conflict(stream_id: &StreamId, stream_version: i64) -> DomainError {
    DomainError::ConcurrencyConflict {
        stream_id: stream_id.to_string(),
        stream_version,
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self), fields(stream_id = %stream_id))]
    async fn retrieve(
        &self,
        stream_id: &StreamId,
        from_version: i64,
        max_events: usize,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let limit = i64::try_from(max_events).unwrap_or(i64::MAX);
        let rows = sqlx::query(SELECT_STREAM)
            .bind(stream_id.as_str())
            .bind(from_version)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| technical("retrieve event stream", &e))?;

        let events = rows
            .iter()
            .map(|row| {
                let occurred_at: String = row
                    .try_get("occurred_at")
                    .map_err(|e| technical("read occurred_at", &e))?;
                Ok(StoredEvent {
                    stream_id: stream_id.clone(),
                    stream_version: row
                        .try_get("stream_version")
                        .map_err(|e| technical("read stream_version", &e))?,
                    event_name: row
                        .try_get("event_name")
                        .map_err(|e| technical("read event_name", &e))?,
                    occurred_at: parse_occurred_at(&occurred_at)?,
                    payload: row
                        .try_get("payload")
                        .map_err(|e| technical("read payload", &e))?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        debug!(count = events.len(), "retrieved events");
        Ok(events)
    }

    #[instrument(skip(self, events, unique_actions), fields(stream_id = %stream_id, count = events.len()))]
    async fn append(
        &self,
        stream_id: &StreamId,
        events: &[StoredEvent],
        unique_actions: &[UniqueIndexAction],
    ) -> Result<(), DomainError> {
        let Some(first) = events.first() else {
            return Ok(());
        };

        let mut tx = self.begin().await?;

        for action in unique_actions {
            Self::apply_unique_action(&mut tx, action).await?;
        }

        let current: i64 = sqlx::query_scalar(SELECT_MAX_STREAM_VERSION)
            .bind(stream_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| technical("read stream version", &e))?;
        if first.stream_version != current + 1 {
            return Err(concurrency_conflict(stream_id, first.stream_version));
        }

        for event in events {
            sqlx::query(INSERT_EVENT)
                .bind(stream_id.as_str())
                .bind(event.stream_version)
                .bind(&event.event_name)
                .bind(format_occurred_at(&event.occurred_at))
                .bind(&event.payload)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_stream_version_violation(&e) {
                        concurrency_conflict(stream_id, event.stream_version)
                    } else {
                        technical("insert event", &e)
                    }
                })?;
        }

        tx.commit().await.map_err(|e| {
            if is_stream_version_violation(&e) {
                concurrency_conflict(stream_id, first.stream_version)
            } else {
                technical("commit append", &e)
            }
        })?;

        info!(
            stream_version = first.stream_version,
            event_name = %first.event_name,
            "appended events"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(stream_id = %stream_id))]
    async fn purge(&self, stream_id: &StreamId) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        sqlx::query(DELETE_STREAM)
            .bind(stream_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| technical("delete event stream", &e))?;

        for table in SIDE_TABLES {
            sqlx::query(table.remove)
                .bind(stream_id.aggregate_id())
                .execute(&mut *tx)
                .await
                .map_err(|e| technical("delete unique index rows", &e))?;
        }

        tx.commit()
            .await
            .map_err(|e| technical("commit purge", &e))?;

        info!("purged event stream");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_owner(
        &self,
        index: UniqueIndex,
        key: &str,
    ) -> Result<Option<String>, DomainError> {
        let owner: Option<String> = sqlx::query_scalar(side_table(index).find_owner)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| technical("look up unique index owner", &e))?;

        Ok(owner)
    }
}
