//! Accounts Event Store — PostgreSQL persistence for event streams.
//!
//! [`pg_event_store::PgEventStore`] implements
//! [`accounts_core::repository::EventStore`] on top of the `events` table and
//! the uniqueness side tables created by the workspace migrations.

pub mod pg_event_store;
pub mod schema;
