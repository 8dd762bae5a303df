//! Accounts — Identity bounded context.
//!
//! Responsible for login identities: registration with an Argon2id-hashed
//! password, deletion, and credential verification.

pub mod application;
pub mod domain;
