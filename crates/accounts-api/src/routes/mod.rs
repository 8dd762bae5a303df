//! Route modules organized by bounded context.

pub mod customers;
pub mod health;
pub mod identities;
