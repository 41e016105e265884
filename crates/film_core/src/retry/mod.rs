//! Bounded retry with exponential backoff and jitter.
//!
//! Provider APIs rate-limit (worth retrying) and reject bad input (not
//! worth retrying). Callers pass a classifier so the two are never
//! conflated; retrying a permanent failure wastes quota and time.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::cancel::CancelHandle;
use crate::config::RetrySettings;

/// Upper bound on a single backoff wait.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Granularity of cancellation checks during a backoff wait.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// How a failure should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying (rate limit, network hiccup, 5xx).
    Transient,
    /// Retrying cannot help (validation error, unsupported request).
    Permanent,
}

/// Terminal failure from a retried operation.
#[derive(Error, Debug)]
pub enum RetryError<E: std::error::Error> {
    /// The failure was classified permanent; exactly one attempt was made.
    #[error("permanent failure after {attempts} attempt(s): {source}")]
    Permanent {
        attempts: u32,
        #[source]
        source: E,
    },

    /// Every attempt in the budget failed transiently.
    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// Cancellation was requested during a wait or between attempts.
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl<E: std::error::Error> RetryError<E> {
    /// Attempts consumed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Permanent { attempts, .. }
            | RetryError::Exhausted { attempts, .. }
            | RetryError::Cancelled { attempts } => *attempts,
        }
    }
}

/// Successful value plus the attempts it took to get it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Bounded exponential backoff wrapper for fallible operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts, first try included.
    max_attempts: u32,
    /// Base delay; attempt n waits `base * 2^(n-1)` plus jitter.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit budget.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build from the settings file section.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs_f64(settings.base_delay_secs.max(0.0)),
        )
    }

    /// Maximum attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation`, retrying transient failures with backoff.
    ///
    /// Permanent failures abort after the first attempt. The cancel
    /// handle is honored before each attempt and during backoff waits;
    /// cancellation never interrupts an attempt already in flight.
    pub fn execute<T, E, O, C>(
        &self,
        cancel: &CancelHandle,
        mut operation: O,
        classify: C,
    ) -> Result<RetryOutcome<T>, RetryError<E>>
    where
        E: std::error::Error,
        O: FnMut() -> Result<T, E>,
        C: Fn(&E) -> ErrorClass,
    {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            attempt += 1;
            match operation() {
                Ok(value) => return Ok(RetryOutcome { value, attempts: attempt }),
                Err(error) => match classify(&error) {
                    ErrorClass::Permanent => {
                        return Err(RetryError::Permanent {
                            attempts: attempt,
                            source: error,
                        });
                    }
                    ErrorClass::Transient => {
                        if attempt >= self.max_attempts {
                            return Err(RetryError::Exhausted {
                                attempts: attempt,
                                source: error,
                            });
                        }

                        let delay = self.backoff_delay(attempt);
                        tracing::debug!(
                            attempt,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "transient failure, backing off"
                        );

                        if self.wait(cancel, delay) {
                            return Err(RetryError::Cancelled { attempts: attempt });
                        }
                    }
                },
            }
        }
    }

    /// Delay before the retry following attempt `attempt` (1-based):
    /// `base * 2^(attempt-1)`, capped, plus jitter in `[0, base)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(MAX_DELAY);

        let base_secs = self.base_delay.as_secs_f64();
        if base_secs <= 0.0 {
            return exp;
        }
        let jitter = rand::thread_rng().gen_range(0.0..base_secs);
        exp + Duration::from_secs_f64(jitter)
    }

    /// Sleep for `delay`, waking early on cancellation.
    ///
    /// Returns true if cancellation was requested.
    fn wait(&self, cancel: &CancelHandle, delay: Duration) -> bool {
        let mut remaining = delay;
        while remaining > Duration::ZERO {
            if cancel.is_cancelled() {
                return true;
            }
            let slice = remaining.min(WAIT_SLICE);
            std::thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use thiserror::Error;

    #[derive(Error, Debug)]
    enum FakeError {
        #[error("rate limited")]
        RateLimited,
        #[error("bad prompt")]
        BadPrompt,
    }

    fn classify(error: &FakeError) -> ErrorClass {
        match error {
            FakeError::RateLimited => ErrorClass::Transient,
            FakeError::BadPrompt => ErrorClass::Permanent,
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn succeeds_first_try() {
        let cancel = CancelHandle::new();
        let outcome = fast_policy(5)
            .execute(&cancel, || Ok::<_, FakeError>(42), classify)
            .unwrap();
        assert_eq!(outcome.value, 42);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn transient_failures_then_success_consumes_full_budget() {
        let cancel = CancelHandle::new();
        let calls = Cell::new(0u32);

        // Fails transiently exactly max_attempts - 1 times, then succeeds.
        let outcome = fast_policy(5)
            .execute(
                &cancel,
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 5 {
                        Err(FakeError::RateLimited)
                    } else {
                        Ok("frame")
                    }
                },
                classify,
            )
            .unwrap();

        assert_eq!(outcome.value, "frame");
        assert_eq!(outcome.attempts, 5);
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn permanent_failure_aborts_after_one_attempt() {
        let cancel = CancelHandle::new();
        let calls = Cell::new(0u32);

        let result = fast_policy(5).execute(
            &cancel,
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>(FakeError::BadPrompt)
            },
            classify,
        );

        assert!(matches!(
            result,
            Err(RetryError::Permanent { attempts: 1, .. })
        ));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exhausts_budget_on_persistent_transient_failure() {
        let cancel = CancelHandle::new();
        let calls = Cell::new(0u32);

        let result = fast_policy(3).execute(
            &cancel,
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>(FakeError::RateLimited)
            },
            classify,
        );

        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn cancelled_before_start_makes_no_attempt() {
        let cancel = CancelHandle::new();
        cancel.cancel();

        let result = fast_policy(5).execute(
            &cancel,
            || Ok::<_, FakeError>(1),
            classify,
        );

        assert!(matches!(
            result,
            Err(RetryError::Cancelled { attempts: 0 })
        ));
    }

    #[test]
    fn cancellation_during_backoff_stops_retrying() {
        let cancel = CancelHandle::new();
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(5, Duration::from_millis(200));

        let result = policy.execute(
            &cancel,
            || {
                calls.set(calls.get() + 1);
                // Cancel while the policy is waiting out the backoff.
                cancel.cancel();
                Err::<(), _>(FakeError::RateLimited)
            },
            classify,
        );

        assert!(matches!(
            result,
            Err(RetryError::Cancelled { attempts: 1 })
        ));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_delay_grows_exponentially() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        // Jitter adds [0, base), so attempt n lands in
        // [base * 2^(n-1), base * 2^(n-1) + base).
        for attempt in 1..=4 {
            let delay = policy.backoff_delay(attempt);
            let floor = Duration::from_secs(2 * 2u64.pow(attempt - 1));
            assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
            assert!(delay < floor + Duration::from_secs(2));
        }
    }

    #[test]
    fn backoff_delay_is_capped() {
        let policy = RetryPolicy::new(20, Duration::from_secs(30));
        let delay = policy.backoff_delay(10);
        assert!(delay <= MAX_DELAY + Duration::from_secs(30));
    }
}
