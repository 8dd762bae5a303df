//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_name(&self) -> &'static str;

    /// Id of this command message; becomes the causation id of its events.
    fn message_id(&self) -> Uuid;
}
