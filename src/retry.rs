//! Bounded retries with pluggable backoff
//!
//! Wraps a fallible async operation with a fixed attempt budget and a delay
//! between attempts. Call sites supply a classifier that decides whether an
//! error is worth retrying at all; malformed-page errors, for example, are
//! terminal no matter how many attempts remain.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Delay schedule applied between attempts
///
/// One scheme is chosen per call site: link discovery escalates linearly
/// with the attempt number, detail fetching sleeps a bounded random interval.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// Delay grows with the attempt number: `attempt * step`
    Linear { step: Duration },

    /// Uniformly random delay in `[min, max]`
    Jittered { min: Duration, max: Duration },
}

impl Backoff {
    /// Computes the delay to sleep after the given (1-based) failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Linear { step } => *step * attempt,
            Backoff::Jittered { min, max } => {
                if max <= min {
                    return *min;
                }
                let span = (*max - *min).as_millis() as u64;
                *min + Duration::from_millis(rand::thread_rng().gen_range(0..=span))
            }
        }
    }
}

/// How a call site classifies a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient failure, another attempt may succeed
    Retryable,

    /// Permanent failure for this unit of work, do not retry
    Terminal,
}

/// Returned when the attempt budget is exhausted or a terminal error occurs
///
/// Carries the last underlying cause and how many invocations were made.
/// Callers log it and skip the unit of work; it never aborts the run.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {last}")]
pub struct RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub attempts: u32,
    #[source]
    pub last: E,
}

/// A bounded retry policy with a backoff schedule
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Creates a policy that makes at most `max_attempts` invocations
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Runs `op` until it succeeds, is classified terminal, or the attempt
    /// budget runs out
    ///
    /// Each invocation of `op` is independent; the only state shared across
    /// attempts is the attempt counter. Between retryable failures the task
    /// sleeps for the backoff delay.
    ///
    /// # Arguments
    ///
    /// * `op` - Factory producing a fresh future per attempt
    /// * `classify` - Maps an error to retryable or terminal
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - One of the attempts succeeded
    /// * `Err(RetryError)` - Terminal failure or budget exhausted
    pub async fn run<T, E, F, Fut, C>(
        &self,
        mut op: F,
        classify: C,
    ) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        C: Fn(&E) -> Disposition,
        E: std::error::Error + 'static,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if classify(&error) == Disposition::Terminal {
                        tracing::debug!(attempt, error = %error, "terminal error, not retrying");
                        return Err(RetryError {
                            attempts: attempt,
                            last: error,
                        });
                    }
                    if attempt >= self.max_attempts {
                        return Err(RetryError {
                            attempts: attempt,
                            last: error,
                        });
                    }
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
