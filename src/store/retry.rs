//! Bounded retry for transient store failures

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use super::StoreError;

/// How many times, and how patiently, to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Linear backoff with up to 50% random jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay * (attempt + 1);
        let jitter_ms = base.as_millis() as u64 / 2;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50))
    }
}

/// Run a store call, retrying `Unavailable` failures up to the policy limit.
/// Non-retryable errors are returned immediately.
pub async fn with_store_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "Store unavailable, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_store_retry(&fast(), "find_one", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::Unavailable("timed out".to_string()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_store_retry(&fast(), "insert_one", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".to_string()))
        })
        .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        // First attempt plus three retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_does_not_retry_duplicate_key() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_store_retry(&fast(), "insert_one", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::DuplicateKey("mobile_number".to_string()))
        })
        .await;

        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let first = policy.delay_for(0);
        let third = policy.delay_for(2);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        assert!(third >= Duration::from_millis(300) && third <= Duration::from_millis(450));
    }
}
