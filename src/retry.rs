//! Backoff for upstream API calls.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::errors::PosterError;

/// Retries after the first attempt.
pub const MAX_RETRIES: usize = 3;

/// Run `operation`, retrying only transient failures with jittered exponential backoff.
///
/// Definitive rejections (bad credentials, refused content) are returned at once.
pub async fn with_retry<F, Fut, T>(operation: F) -> Result<T, PosterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PosterError>>,
{
    with_retry_if(operation, PosterError::is_transient).await
}

/// Like [`with_retry`], but only errors accepted by `should_retry` are retried.
pub async fn with_retry_if<F, Fut, T, C>(operation: F, should_retry: C) -> Result<T, PosterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PosterError>>,
    C: FnMut(&PosterError) -> bool,
{
    // 200ms, 400ms, 800ms before jitter
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(MAX_RETRIES);

    RetryIf::spawn(strategy, operation, should_retry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let attempts = AtomicUsize::new(0);
        let result = with_retry(|| async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(PosterError::RateLimited("slow down".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_definitive_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(PosterError::PublishAuthFailure("bad token".to_string()))
        })
        .await;

        assert!(matches!(result, Err(PosterError::PublishAuthFailure(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(PosterError::HttpError("connection reset".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn test_custom_condition_narrows_retries() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry_if(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PosterError::Unavailable("503".to_string()))
            },
            PosterError::is_safe_to_resend,
        )
        .await;

        assert!(matches!(result, Err(PosterError::Unavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
