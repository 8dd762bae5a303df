//! Stream identifiers.

use std::fmt;

/// Identifier of one event stream, e.g. `customer-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId {
    value: String,
    prefix_len: usize,
}

impl StreamId {
    /// Builds the stream id for the aggregate `aggregate_id` of type `prefix`.
    #[must_use]
    pub fn new(prefix: &str, aggregate_id: impl fmt::Display) -> Self {
        Self {
            value: format!("{prefix}-{aggregate_id}"),
            prefix_len: prefix.len(),
        }
    }

    /// The full stream id as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The aggregate type prefix, e.g. `customer`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.value[..self.prefix_len]
    }

    /// The aggregate id part after the prefix.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.value[self.prefix_len + 1..]
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
