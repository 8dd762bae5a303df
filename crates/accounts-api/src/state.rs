//! Shared application state.

use std::sync::Arc;

use accounts_core::repository::EventStore;
use accounts_core::time::Clock;
use accounts_identity::domain::password::PasswordHashingParams;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock stamped on recorded events.
    pub clock: Arc<dyn Clock>,
    /// Event store for all aggregates.
    pub event_store: Arc<dyn EventStore>,
    /// Retry budget for command handlers.
    pub max_retries: u32,
    /// Argon2id cost for new identities.
    pub password_hashing: PasswordHashingParams,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        event_store: Arc<dyn EventStore>,
        max_retries: u32,
        password_hashing: PasswordHashingParams,
    ) -> Self {
        Self {
            clock,
            event_store,
            max_retries,
            password_hashing,
        }
    }
}
