//! Accounts Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the customer and
//! identity contexts depend on: the error taxonomy, event metadata, the
//! event store contract and the bounded retry loop. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod command;
pub mod email;
pub mod error;
pub mod event;
pub mod repository;
pub mod retry;
pub mod stream;
pub mod time;
