//! Deadline helper for async operations.

use std::future::Future;
use std::time::Duration;

use crate::types::{FilerError, Result};

/// Run `future` with a deadline.
///
/// Returns `FilerError::Timeout` naming `operation` when the deadline passes
/// first; the future is dropped.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(FilerError::timeout(operation, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, FilerError>(42) },
            "classification",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, FilerError>(42)
            },
            "classification",
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, FilerError::Timeout { .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("classification"));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<()> = with_timeout(
            Duration::from_secs(1),
            async { Err(FilerError::Config("bad".to_string())) },
            "classification",
        )
        .await;
        assert!(matches!(result, Err(FilerError::Config(_))));
    }
}
