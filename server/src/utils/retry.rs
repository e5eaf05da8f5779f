//! Async retry utilities with exponential backoff

use std::time::Duration;

/// Default maximum attempts for analytics requests
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds for exponential backoff
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Retry an async operation with exponential backoff.
///
/// Errors for which `is_retryable` returns false are returned immediately.
/// `max_attempts` of 0 is treated as 1.
pub async fn retry_with_backoff_async<F, Fut, T, E, R>(
    max_attempts: u32,
    base_delay_ms: u64,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let delay = Duration::from_millis(base_delay_ms * 2_u64.pow(attempts - 1));
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_success_on_first_try() {
        let result = retry_with_backoff_async(3, 10, |_: &&str| true, || async {
            Ok::<_, &str>(7)
        })
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let attempts = Cell::new(0);
        let result = retry_with_backoff_async(
            3,
            10,
            |_: &&str| true,
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move {
                    if n < 2 {
                        Err("transient error")
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_failure_after_max_retries() {
        let attempts = Cell::new(0);
        let result = retry_with_backoff_async(
            3,
            1,
            |_: &&str| true,
            || {
                attempts.set(attempts.get() + 1);
                async { Err::<(), _>("persistent error") }
            },
        )
        .await;
        assert_eq!(result, Err("persistent error"));
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let attempts = Cell::new(0);
        let result = retry_with_backoff_async(
            5,
            1,
            |e: &&str| *e != "bad request",
            || {
                attempts.set(attempts.get() + 1);
                async { Err::<(), _>("bad request") }
            },
        )
        .await;
        assert_eq!(result, Err("bad request"));
        assert_eq!(attempts.get(), 1);
    }
}
