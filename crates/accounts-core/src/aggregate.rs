//! Aggregate state projection.

use crate::event::DomainEvent;

/// State that is derived exclusively by folding an aggregate's event stream.
pub trait Projection: Sized + Send + Sync {
    /// The event type this projection consumes.
    type Event: DomainEvent;

    /// Apply one event to the state.
    fn apply(&mut self, event: &Self::Event);

    /// The stream version of the last applied event, 0 for an empty stream.
    fn current_version(&self) -> i64;

    /// Folds `events`, in order, into `self`.
    #[must_use]
    fn replay<'a, I>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        for event in events {
            self.apply(event);
        }
        self
    }
}
