// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for transient provider failures.

use std::future::Future;
use std::time::Duration;

use glossa_config::model::RetryConfig;
use thiserror::Error;
use tracing::warn;

/// Retry schedule: attempt `n` (1-based) waits `starting_delay * multiplier^(n-1)`
/// before running again, optionally capped by `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub starting_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            starting_delay: Duration::from_secs(config.starting_delay_secs),
            multiplier: config.multiplier,
            max_delay: config.max_delay_secs.map(Duration::from_secs),
        }
    }
}

impl BackoffPolicy {
    /// Delay slept after the `failed_attempt`-th failure.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let secs = self.starting_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// An attempt failed with an error that must not be retried.
    #[error("attempt {attempt} failed permanently: {error}")]
    Aborted { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Aborted { error, .. } => error,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Aborted { attempt, .. } => *attempt,
        }
    }
}

/// Runs `op` until it succeeds, `should_retry` rejects an error, or the
/// attempt budget is spent. The first attempt runs immediately; `op` receives
/// the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &BackoffPolicy,
    mut op: F,
    should_retry: R,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if !should_retry(&error) => {
                return Err(RetryError::Aborted { attempt, error });
            }
            Err(error) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts,
            starting_delay: Duration::from_secs(20),
            multiplier: 2.0,
            max_delay: None,
        }
    }

    #[test]
    fn delays_grow_geometrically() {
        let p = policy(10);
        assert_eq!(p.delay_for(1), Duration::from_secs(20));
        assert_eq!(p.delay_for(2), Duration::from_secs(40));
        assert_eq!(p.delay_for(3), Duration::from_secs(80));
    }

    #[test]
    fn delay_respects_cap() {
        let mut p = policy(10);
        p.max_delay = Some(Duration::from_secs(60));
        assert_eq!(p.delay_for(5), Duration::from_secs(60));
    }

    #[test]
    fn huge_exponent_saturates() {
        let p = policy(u32::MAX);
        assert_eq!(p.delay_for(5000), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let start = Instant::now();

        let result = retry_with_backoff(
            &policy(5),
            move |_| {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("busy")
                    } else {
                        Ok("done")
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 20s + 40s of backoff
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempt_budget() {
        let result: Result<(), _> =
            retry_with_backoff(&policy(3), |_| async { Err("busy") }, |_| true).await;
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "busy");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = retry_with_backoff(
            &policy(10),
            move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request") }
            },
            |e| *e != "bad request",
        )
        .await;

        assert!(matches!(result, Err(RetryError::Aborted { attempt: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_numbers_are_passed_to_op() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = seen.clone();
        let _: Result<(), _> = retry_with_backoff(
            &policy(3),
            move |n| {
                s.lock().unwrap().push(n);
                async { Err("busy") }
            },
            |_| true,
        )
        .await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }
}
