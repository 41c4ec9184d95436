use std::{future::Future, time::Duration};

use tokio::time::Instant;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("{0}")]
    Retryable(E),
    #[error("{0}")]
    NonRetryable(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Retryable(e) => e,
            RetryError::NonRetryable(e) => e,
        }
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or `budget` runs out.
///
/// Between attempts the delay doubles from 500ms up to 10s. A wait that would
/// overrun the budget is not started; the last retryable error is returned instead.
pub async fn retry_for<T, E, F, Fut>(budget: Duration, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    let deadline = Instant::now() + budget;
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => {
                if Instant::now() + backoff > deadline {
                    tracing::warn!("Giving up after {} attempts: {}", attempt, e);
                    return Err(e);
                }
                tracing::warn!("Attempt {} failed, retrying in {:?}: {}", attempt, backoff, e);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let calls = &AtomicU32::new(0);
        let res: Result<u32, String> = retry_for(Duration::from_secs(60), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;

        assert_eq!(res.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_fast() {
        let calls = &AtomicU32::new(0);
        let res: Result<(), String> = retry_for(Duration::from_secs(60), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RetryError::NonRetryable(String::from("AccessDenied")))
        })
        .await;

        assert_eq!(res.unwrap_err(), "AccessDenied");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = &AtomicU32::new(0);
        let res: Result<&str, String> = retry_for(Duration::from_secs(60), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(RetryError::Retryable(String::from("InvalidViewerCertificate")))
            } else {
                Ok("updated")
            }
        })
        .await;

        assert_eq!(res.unwrap(), "updated");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_when_budget_is_spent() {
        let calls = &AtomicU32::new(0);
        let started = Instant::now();
        let res: Result<(), String> = retry_for(Duration::from_secs(60), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RetryError::Retryable(String::from("InvalidViewerCertificate")))
        })
        .await;

        assert_eq!(res.unwrap_err(), "InvalidViewerCertificate");
        assert!(started.elapsed() <= Duration::from_secs(60));
        // 0.5 + 1 + 2 + 4 + 8 + 10 * 4 = 55.5s of waiting, the next 10s wait would overrun.
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }
}
