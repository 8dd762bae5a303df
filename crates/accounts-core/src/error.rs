//! Domain error types.
//!
//! Every error carries exactly one [`ErrorKind`]. Callers branch on
//! [`DomainError::kind`]; the message chain is diagnostic only.

use std::fmt;

use thiserror::Error;

/// The marker callers use to discriminate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A command or query carried malformed input.
    InputInvalid,
    /// The addressed aggregate does not exist or was deleted.
    NotFound,
    /// A uniqueness side table rejected the write.
    Duplicate,
    /// A business rule rejected the command after it was recorded.
    DomainConstraintsViolation,
    /// Another writer claimed the same stream version first.
    ConcurrencyConflict,
    /// The bounded retry loop gave up on repeated conflicts.
    MaxRetriesExceeded,
    /// Credentials did not match a live identity.
    InvalidCredentials,
    /// An event could not be turned into bytes.
    MarshalingFailed,
    /// Stored bytes could not be turned back into an event.
    UnmarshalingFailed,
    /// Driver, I/O or other infrastructure failure.
    Technical,
}

impl ErrorKind {
    /// Returns the `snake_case` name used on external surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputInvalid => "input_invalid",
            Self::NotFound => "not_found",
            Self::Duplicate => "duplicate",
            Self::DomainConstraintsViolation => "domain_constraints_violation",
            Self::ConcurrencyConflict => "concurrency_conflict",
            Self::MaxRetriesExceeded => "max_retries_exceeded",
            Self::InvalidCredentials => "invalid_credentials",
            Self::MarshalingFailed => "marshaling_failed",
            Self::UnmarshalingFailed => "unmarshaling_failed",
            Self::Technical => "technical",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Value construction rejected the input.
    #[error("input invalid: {0}")]
    InputInvalid(String),

    /// The aggregate was not found or is deleted.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique side-table constraint was violated.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// A failure event was recorded for the command.
    #[error("domain constraints violation: {0}")]
    DomainConstraintsViolation(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on stream {stream_id} at version {stream_version}")]
    ConcurrencyConflict {
        /// The stream that had the conflict.
        stream_id: String,
        /// The version that was already taken.
        stream_version: i64,
    },

    /// The retry budget was exhausted.
    #[error("max retries exceeded after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        /// How many attempts were made.
        attempts: u32,
        /// The error that ended the final attempt.
        #[source]
        last: Box<DomainError>,
    },

    /// Credentials were rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Event serialization failed.
    #[error("marshaling failed: {0}")]
    MarshalingFailed(String),

    /// Event deserialization failed.
    #[error("unmarshaling failed: {0}")]
    UnmarshalingFailed(String),

    /// An infrastructure/persistence error.
    #[error("technical error: {0}")]
    Technical(String),

    /// Operation context wrapped around another error. Keeps the inner kind.
    #[error("{context}: {source}")]
    Context {
        /// What was being attempted.
        context: String,
        /// The wrapped error.
        #[source]
        source: Box<DomainError>,
    },
}

impl DomainError {
    /// Returns the kind of this error, looking through any context layers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputInvalid(_) => ErrorKind::InputInvalid,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::DomainConstraintsViolation(_) => ErrorKind::DomainConstraintsViolation,
            Self::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            Self::MaxRetriesExceeded { .. } => ErrorKind::MaxRetriesExceeded,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::MarshalingFailed(_) => ErrorKind::MarshalingFailed,
            Self::UnmarshalingFailed(_) => ErrorKind::UnmarshalingFailed,
            Self::Technical(_) => ErrorKind::Technical,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// Returns `true` if this error is of the given kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Wraps this error with operation context.
    #[must_use]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Adds operation context to `Result<T, DomainError>` without changing the kind.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with `context`.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`DomainError::Context`].
    fn context(self, context: impl Into<String>) -> Result<T, DomainError>;
}

impl<T> ResultExt<T> for Result<T, DomainError> {
    fn context(self, context: impl Into<String>) -> Result<T, DomainError> {
        self.map_err(|err| err.with_context(context))
    }
}
