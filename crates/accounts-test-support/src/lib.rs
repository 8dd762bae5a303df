//! Shared test mocks and utilities for the event-sourced account store.

mod clock;
mod repository;

pub use clock::FixedClock;
pub use repository::{ConflictingEventStore, FailingEventStore, InMemoryEventStore};
