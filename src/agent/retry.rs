// VIDFORGE Retry Helpers
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE
//
// Exponential backoff around a single external call: attempt `n` (0-based)
// sleeps `base_delay * 2^n` before the next try.

use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `op` until it succeeds or the policy is exhausted; the last error is returned.
pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    info!("[RETRY] ✓ {} succeeded on attempt {}", label, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) => {
                error!(
                    "[RETRY] ✗ Error in {} (attempt {}/{}): {:#}",
                    label,
                    attempt + 1,
                    attempts,
                    e
                );
                if attempt + 1 >= attempts {
                    return Err(e);
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Like [`with_backoff`] but swallows the final error and returns `fallback`.
pub async fn with_fallback<T, F, Fut>(policy: RetryPolicy, label: &str, fallback: T, op: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    match with_backoff(policy, label, op).await {
        Ok(value) => value,
        Err(_) => {
            warn!("[RETRY] ↩ Using fallback for {}", label);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(1));

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(FAST, "flaky", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    anyhow::bail!("not yet")
                }
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fallback_after_exhaustion() {
        let calls = AtomicU32::new(0);
        let value: Vec<u32> = with_fallback(FAST, "always_fails", vec![], || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { anyhow::bail!("down") }
        })
        .await;
        assert!(value.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
