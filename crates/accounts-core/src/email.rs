//! Email address value shared by the customer and identity contexts.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

static EMAIL_ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+@\S+\.\w{2,}$").expect("email address pattern is a valid regex")
});

/// A syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates `input` against `^\S+@\S+\.\w{2,}$`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InputInvalid` if `input` does not match.
    pub fn build(input: &str) -> Result<Self, DomainError> {
        if !EMAIL_ADDRESS_PATTERN.is_match(input) {
            return Err(DomainError::InputInvalid(format!(
                "email address {input:?} has an invalid format"
            )));
        }
        Ok(Self(input.to_owned()))
    }

    /// Reconstructs a previously validated address without checking it.
    #[must_use]
    pub fn rebuild(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The address as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
