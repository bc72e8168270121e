//! Retry with exponential backoff for transient upstream failures

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

/// Run `op` up to `max_attempts` times, sleeping `backoff_base_ms * 2^n`
/// between attempts. Only errors where `is_transient()` holds are retried.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    max_attempts: usize,
    backoff_base_ms: u64,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let backoff_ms = backoff_base_ms.saturating_mul(2_u64.saturating_pow(attempt as u32 - 1));
                warn!(
                    "{} failed ({}), retrying after {}ms (attempt {}/{})",
                    label, e, backoff_ms, attempt, max_attempts
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WardrobeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("test", 3, 1, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(WardrobeError::RateLimitExceeded("slow down".into()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry("test", 5, 1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(WardrobeError::Authentication("bad key".into()))
        })
        .await;

        assert!(matches!(result, Err(WardrobeError::Authentication(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry("test", 2, 1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(WardrobeError::Network("reset".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
