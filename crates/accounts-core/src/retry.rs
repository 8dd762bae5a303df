//! Bounded retry on optimistic concurrency conflicts.

use std::future::Future;

use tracing::warn;

use crate::error::{DomainError, ErrorKind};

/// Default retry budget for command handlers.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Runs `attempt` until it succeeds, fails with anything other than a
/// concurrency conflict, or has been run `max_retries` times.
///
/// There is no backoff between attempts.
///
/// # Errors
///
/// Returns the first non-conflict error unchanged, or
/// `DomainError::MaxRetriesExceeded` wrapping the last conflict.
pub async fn retry_on_concurrency_conflict<T, F, Fut>(
    max_retries: u32,
    mut attempt: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut last_conflict = None;

    for attempt_number in 1..=max_retries {
        match attempt().await {
            Err(err) if err.is(ErrorKind::ConcurrencyConflict) => {
                warn!(
                    attempt = attempt_number,
                    max_retries,
                    error = %err,
                    "concurrency conflict, retrying"
                );
                last_conflict = Some(err);
            }
            outcome => return outcome,
        }
    }

    let last = last_conflict
        .unwrap_or_else(|| DomainError::Technical("retry budget allows no attempts".into()));

    Err(DomainError::MaxRetriesExceeded {
        attempts: max_retries,
        last: Box::new(last),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn conflict() -> DomainError {
        DomainError::ConcurrencyConflict {
            stream_id: "customer-1".into(),
            stream_version: 2,
        }
    }

    #[tokio::test]
    async fn test_returns_first_success() {
        // Arrange
        let counter = AtomicU32::new(0);
        let calls = &counter;

        // Act
        let result = retry_on_concurrency_conflict(10, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, DomainError>(42)
        })
        .await;

        // Assert
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        // Arrange
        let counter = AtomicU32::new(0);
        let calls = &counter;

        // Act
        let result = retry_on_concurrency_conflict(10, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(conflict())
            } else {
                Ok(())
            }
        })
        .await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        // Arrange
        let counter = AtomicU32::new(0);
        let calls = &counter;

        // Act
        let result: Result<(), _> = retry_on_concurrency_conflict(10, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MaxRetriesExceeded);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        match err {
            DomainError::MaxRetriesExceeded { attempts, last } => {
                assert_eq!(attempts, 10);
                assert_eq!(last.kind(), ErrorKind::ConcurrencyConflict);
            }
            other => panic!("expected MaxRetriesExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_does_not_retry_other_errors() {
        // Arrange
        let counter = AtomicU32::new(0);
        let calls = &counter;

        // Act
        let result: Result<(), _> = retry_on_concurrency_conflict(10, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::Duplicate("email taken".into()))
        })
        .await;

        // Assert
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Duplicate);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_context_wrapped_conflicts_are_still_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> = retry_on_concurrency_conflict(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict().with_context("append customer events"))
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::MaxRetriesExceeded);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
