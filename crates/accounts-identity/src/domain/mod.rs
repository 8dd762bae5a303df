//! Domain layer: values, events, commands, state projection and decisions.

pub mod aggregates;
pub mod commands;
pub mod decisions;
pub mod events;
pub mod password;
pub mod values;
