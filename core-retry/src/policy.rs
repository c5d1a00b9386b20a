//! Generic retry loop with capped, jittered exponential backoff

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::RetryError;

/// How the injected classifier judged a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to resolve itself; worth retrying
    Transient,
    /// Will not resolve by retrying; surface immediately
    Permanent,
}

/// Backoff configuration
///
/// The loop blocks its caller for at most `max_attempts` calls plus the
/// intervening delays, additionally bounded by `max_elapsed` wall time.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total calls allowed, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Growth factor between delays
    pub multiplier: f64,
    /// Upper bound on total elapsed time across attempts
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 1.5,
            max_elapsed: Some(Duration::from_secs(120)),
        }
    }
}

/// Retry-policy object: one configuration, shared by every call site.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `op` until it succeeds, fails permanently, exhausts the attempt
    /// or time budget, or the token is cancelled.
    ///
    /// `op` must be safe to invoke more than once. The loop does not
    /// deduplicate partially applied remote writes; that is the caller's
    /// precondition.
    pub async fn run<T, E, C, F, Fut>(
        &self,
        cancel: &CancellationToken,
        classify: C,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        C: Fn(&E) -> ErrorClass,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let mut delay = self.config.initial_delay;
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            attempts += 1;
            let error = match op().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if classify(&error) == ErrorClass::Permanent {
                return Err(RetryError::Permanent(error));
            }

            if attempts >= self.config.max_attempts {
                warn!(attempts, error = %error, "giving up after transient failures");
                return Err(RetryError::Exhausted {
                    attempts,
                    last: error,
                });
            }
            if let Some(max_elapsed) = self.config.max_elapsed {
                if started.elapsed() >= max_elapsed {
                    warn!(attempts, error = %error, "retry time budget exhausted");
                    return Err(RetryError::Exhausted {
                        attempts,
                        last: error,
                    });
                }
            }

            let sleep_for = jittered(delay);
            debug!(
                attempt = attempts,
                delay_ms = sleep_for.as_millis() as u64,
                error = %error,
                "transient failure, backing off"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(sleep_for) => {}
            }

            delay = next_delay(delay, self.config.multiplier, self.config.max_delay);
        }
    }
}

fn next_delay(current: Duration, multiplier: f64, max: Duration) -> Duration {
    let grown = current.mul_f64(multiplier);
    if grown > max {
        max
    } else {
        grown
    }
}

/// Randomize a delay into [0.5, 1.5] of its nominal value so that herds of
/// independent reconcilers do not synchronize against the appliance.
fn jittered(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.5..=1.5);
    delay.mul_f64(factor)
}
