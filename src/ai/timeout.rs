//! Round Timeout Helper
//!
//! Every model round is bounded by its model's `timeout`. The HTTP client
//! enforces it on the transport; this wrapper bounds the whole round, body read
//! and credential lookup included.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let response = with_timeout(model.timeout, backend_call, "model round").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{RecastError, Result};

/// Execute an async operation with a timeout
///
/// Returns `RecastError::Timeout` if the operation doesn't complete within
/// `timeout`. The inner output is returned untouched.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(output) => Ok(output),
        Err(_) => Err(RecastError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorCategory, RoundError};

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }, "test operation").await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                42
            },
            "slow operation",
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, RecastError::Timeout { .. }));
        assert!(err.to_string().contains("slow operation"));
    }

    #[tokio::test]
    async fn test_expired_round_becomes_billed_round_error() {
        let err = with_timeout(
            Duration::from_millis(5),
            std::future::pending::<()>(),
            "model round",
        )
        .await
        .unwrap_err();
        let round_error = RoundError::from(err);
        assert_eq!(round_error.category, ErrorCategory::Timeout);
        assert!(round_error.is_billed());
    }
}
