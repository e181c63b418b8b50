//! Backoff Retry Executor.
//!
//! Wraps any fallible async operation with bounded, strictly sequential
//! attempts and exponential delays (`base * 2^(attempt-1)`: 1s, 2s, 4s, 8s
//! with the default policy). The executor knows nothing about what it runs.
//!
//! Delays go through [`AuguryContext::sleep`], so a virtual clock makes the
//! schedule observable in tests, and a cancellation token ends the wait early.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use augury_env::AuguryContext;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Attempt limit and delay schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (default: 5)
    pub max_attempts: u32,

    /// Delay after the first failure; doubles after each further failure (default: 1s)
    pub base_delay: Duration,

    /// How many earlier error messages to keep besides the last error (default: 4)
    pub history_limit: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            history_limit: 4,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default history limit.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Sets the history limit.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Delay inserted after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of the delays inserted after `failures` consecutive failures.
    pub fn total_delay(&self, failures: u32) -> Duration {
        (1..=failures).map(|a| self.delay_after(a)).sum()
    }
}

/// Failure of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed.
    #[error("failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: E,
        /// Earlier attempt errors, oldest first, bounded by the policy
        history: Vec<String>,
    },

    /// The cancellation token fired before the next attempt was issued.
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    /// Number of invocations actually made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Runs `operation` until it succeeds, the policy is exhausted, or `cancel` fires.
pub async fn retry_with_backoff<Ctx, T, E, F, Fut>(
    ctx: &Ctx,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    Ctx: AuguryContext + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut history: VecDeque<String> = VecDeque::new();
    let mut last: Option<E> = None;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled {
                attempts: attempt - 1,
                last,
            });
        }

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let Some(previous) = last.take() {
            history.push_back(previous.to_string());
            if history.len() > policy.history_limit {
                history.pop_front();
            }
        }

        if attempt == max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
                history: history.into(),
            });
        }

        let delay = policy.delay_after(attempt);
        warn!(
            attempt,
            max_attempts,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying"
        );
        last = Some(err);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts: attempt, last });
            }
            _ = ctx.sleep(delay) => {}
        }
    }

    // Unreachable: the final iteration always returns.
    Err(RetryError::Cancelled {
        attempts: max_attempts,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::SystemTime;

    /// Context that records requested sleeps instead of waiting.
    #[derive(Default)]
    struct RecordingContext {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingContext {
        fn slept(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuguryContext for RecordingContext {
        fn now(&self) -> Duration {
            self.sleeps.lock().unwrap().iter().sum()
        }

        fn system_time(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + self.now()
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    async fn fail_times(
        ctx: &RecordingContext,
        policy: &RetryPolicy,
        failures: u32,
        calls: &AtomicU32,
    ) -> Result<u32, RetryError<String>> {
        retry_with_backoff(ctx, policy, &CancellationToken::new(), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                Err(format!("boom {}", n))
            } else {
                Ok(n)
            }
        })
        .await
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=5).map(|a| policy.delay_after(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
        assert_eq!(policy.total_delay(3), Duration::from_secs(7));
        assert_eq!(policy.total_delay(0), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_succeeds_after_m_failures() {
        let policy = RetryPolicy::default();
        for m in 0..5u32 {
            let ctx = RecordingContext::default();
            let calls = AtomicU32::new(0);

            let result = fail_times(&ctx, &policy, m, &calls).await;

            assert_eq!(result.unwrap(), m + 1);
            assert_eq!(calls.load(Ordering::SeqCst), m + 1);
            assert_eq!(ctx.now(), policy.total_delay(m));
            assert_eq!(ctx.slept().len() as u32, m);
        }
    }

    #[tokio::test]
    async fn test_always_failing_stops_at_five() {
        let ctx = RecordingContext::default();
        let calls = AtomicU32::new(0);

        let err = fail_times(&ctx, &RetryPolicy::default(), u32::MAX, &calls)
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(err.attempts(), 5);
        assert_eq!(err.to_string(), "failed after 5 attempts: boom 5");
        // No sleep after the final attempt
        assert_eq!(ctx.slept().len(), 4);

        match err {
            RetryError::Exhausted { history, .. } => {
                assert_eq!(history, vec!["boom 1", "boom 2", "boom 3", "boom 4"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let ctx = RecordingContext::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(1)).with_history_limit(2);

        let err = fail_times(&ctx, &policy, u32::MAX, &calls).await.unwrap_err();

        match err {
            RetryError::Exhausted { history, last, .. } => {
                assert_eq!(history, vec!["boom 3", "boom 4"]);
                assert_eq!(last, "boom 5");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_all_attempts() {
        let ctx = RecordingContext::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let err = retry_with_backoff(&ctx, &RetryPolicy::default(), &cancel, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await
        .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_between_attempts() {
        let ctx = RecordingContext::default();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let (counter, token) = (&calls, &cancel);

        let err = retry_with_backoff(&ctx, &RetryPolicy::default(), &cancel, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                token.cancel();
            }
            Err::<(), _>("nope".to_string())
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match err {
            RetryError::Cancelled { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.as_deref(), Some("nope"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_means_one() {
        let ctx = RecordingContext::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_secs(1));

        let err = fail_times(&ctx, &policy, u32::MAX, &calls).await.unwrap_err();
        assert_eq!(err.attempts(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
