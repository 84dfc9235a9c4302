//! Shared retry/backoff/timeout policy for every HTTP-backed adapter:
//! `max_retries`, `initial_backoff`, and a per-call `timeout`.

use remind_core::{RemindError, Result};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration, timeout: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            timeout,
        }
    }
}

/// Runs `op` under a per-attempt timeout, retrying transport failures with
/// exponential backoff. `op` must itself produce a `Result<T>`; a
/// `Timeout` result short-circuits the retry loop immediately since
/// retrying a timed-out call is rarely productive and `Timeout` is its own
/// error kind, not a transport failure to paper over.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    adapter_name: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        match tokio::time::timeout(policy.timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(RemindError::Timeout(detail))) => {
                return Err(RemindError::Timeout(detail));
            }
            Ok(Err(err)) if attempt < policy.max_retries => {
                tracing::warn!(adapter = adapter_name, attempt, error = %err, "adapter call failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Ok(Err(err)) => return Err(err),
            Err(_elapsed) => {
                return Err(RemindError::Timeout(format!(
                    "{adapter_name} call exceeded {:?}",
                    policy.timeout
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_secs(1));
        let result = with_retry(policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(RemindError::ExternalUnavailable("boom".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeout_short_circuits_without_retrying() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_secs(1));
        let result: Result<()> = with_retry(policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(RemindError::Timeout("slow".into())) }
        })
        .await;
        assert!(matches!(result, Err(RemindError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
