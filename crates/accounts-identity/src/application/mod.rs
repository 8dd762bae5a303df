//! Application layer: serialization, uniqueness index actions and handlers.

pub mod command_handlers;
pub mod query_handlers;
pub mod serialization;
pub mod unique_identities;
