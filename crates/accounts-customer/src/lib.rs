//! Accounts — Customer bounded context.
//!
//! Responsible for customer registration, email address confirmation and
//! change, name changes and deletion, plus the customer read view.

pub mod application;
pub mod domain;
