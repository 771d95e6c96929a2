use std::future::Future;

use crate::error::AppError;

/// Caller-facing retry policy for dependency timeouts: one immediate retry,
/// no backoff, and only for the retryable infrastructure kind. Every other
/// error is terminal for the request.
pub async fn with_single_retry<T, F, Fut>(op: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match op().await {
        Err(err) if err.is_retryable() => {
            log::warn!("Retrying once after infrastructure timeout: {}", err);
            op().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = with_single_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_retried_exactly_once() {
        let calls = AtomicU32::new(0);
        let result = with_single_retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(AppError::InfrastructureTimeout("store".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_timeout_is_terminal() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_single_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::InfrastructureTimeout("store".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::InfrastructureTimeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_single_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::SessionRevoked("stale".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::SessionRevoked(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
