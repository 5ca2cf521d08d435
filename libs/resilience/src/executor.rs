use std::{fmt::Display, future::Future};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{error::RetryError, policy::RetryPolicy};

/// Runs fallible async operations under a [`RetryPolicy`].
///
/// The operation receives the 1-based attempt number. Failures before the
/// last attempt are logged and retried after the policy's backoff; the last
/// failure is returned inside [`RetryError::Exhausted`]. Once `cancel` fires
/// no further attempt starts.
#[derive(Debug, Clone, Default)]
pub struct ResilienceExecutor {
    policy: RetryPolicy,
}

impl ResilienceExecutor {
    pub fn new(policy: RetryPolicy) -> Self { Self { policy } }

    pub fn policy(&self) -> &RetryPolicy { &self.policy }

    pub async fn execute<T, E, F, Fut>(
        &self, cancel: &CancellationToken, operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        retry(&self.policy, cancel, operation).await
    }

    /// Same as [`execute`](Self::execute) with the attempt bound overridden.
    pub async fn execute_with_retry<T, E, F, Fut>(
        &self, max_attempts: u32, cancel: &CancellationToken, operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let policy = self.policy.clone().with_max_attempts(max_attempts);
        retry(&policy, cancel, operation).await
    }
}

async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy, cancel: &CancellationToken, mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts;
    if max_attempts == 0 {
        return Err(RetryError::InvalidConfiguration { max_attempts });
    }

    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            debug!(attempts = attempt, "Retry loop cancelled");
            return Err(RetryError::Cancelled { attempts: attempt });
        }

        debug!(
            "Executing operation, attempt {}/{}",
            attempt + 1,
            max_attempts
        );

        let err = match operation(attempt + 1).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        attempt += 1;

        if attempt >= max_attempts {
            error!(
                attempts = attempt,
                error = %err,
                "Operation failed after {attempt} attempts"
            );
            return Err(RetryError::Exhausted {
                attempts: attempt,
                source: err,
            });
        }

        if cancel.is_cancelled() {
            debug!(attempts = attempt, "Retry loop cancelled");
            return Err(RetryError::Cancelled { attempts: attempt });
        }

        let delay = policy.delay_for_attempt(attempt);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Operation failed, attempt {attempt}/{max_attempts}. Retrying..."
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(attempts = attempt, "Retry backoff cancelled");
                return Err(RetryError::Cancelled { attempts: attempt });
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
