//! Clock abstraction and the `occurredAt` wire format.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DomainError;

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Formats a timestamp as RFC 3339 with nanosecond precision in UTC.
#[must_use]
pub fn format_occurred_at(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses an RFC 3339 timestamp back into UTC.
///
/// # Errors
///
/// Returns `DomainError::UnmarshalingFailed` if the text is not RFC 3339.
pub fn parse_occurred_at(text: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DomainError::UnmarshalingFailed(format!("invalid occurredAt {text:?}: {e}")))
}

/// Serde adapter for `DateTime<Utc>` using [`format_occurred_at`].
pub mod rfc3339_nanos {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as RFC 3339 with nanoseconds.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_occurred_at(at))
    }

    /// Deserializes from RFC 3339 text.
    ///
    /// # Errors
    ///
    /// Fails when the text is not RFC 3339.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_occurred_at(&text).map_err(serde::de::Error::custom)
    }
}
