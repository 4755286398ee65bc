// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide rate-limited work queue.
//!
//! Every outbound provider request is one task on this queue. Admission is
//! strictly FIFO: callers line up on a fair mutex, then take a concurrency
//! slot, then wait for room in the current rate window. A window opens at the
//! first start after the previous one expired and admits at most
//! `interval_cap` starts before it closes.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use glossa_config::model::QueueConfig;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info};

/// Limits applied by a [`WorkQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Maximum tasks running at once.
    pub concurrency: usize,
    /// Maximum task starts per window.
    pub interval_cap: usize,
    /// Window length.
    pub interval: Duration,
    /// Upper bound on a single task's run time.
    pub task_timeout: Duration,
}

impl From<&QueueConfig> for QueueSettings {
    fn from(config: &QueueConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            interval_cap: config.interval_cap.max(1),
            interval: Duration::from_secs(config.interval_secs),
            task_timeout: Duration::from_secs(config.task_timeout_secs),
        }
    }
}

/// Why a submitted task did not produce a value.
#[derive(Debug, Error)]
pub enum QueueError<E> {
    /// The task ran longer than the per-task timeout and was dropped.
    #[error("queue task timed out after {0:?}")]
    TimedOut(Duration),

    /// The task itself failed.
    #[error("{0}")]
    Task(E),

    /// The queue was closed before the task could start.
    #[error("work queue is closed")]
    Closed,
}

/// Point-in-time queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub active: usize,
    pub pending: usize,
    pub started_total: u64,
}

#[derive(Debug, Default)]
struct Window {
    opened_at: Option<Instant>,
    started: usize,
}

impl Window {
    /// Waits until a start is allowed, then counts it.
    async fn admit(&mut self, cap: usize, interval: Duration) {
        loop {
            let now = Instant::now();
            match self.opened_at {
                Some(opened) if now < opened + interval => {
                    if self.started < cap {
                        self.started += 1;
                        return;
                    }
                    debug!(
                        wait_ms = (opened + interval - now).as_millis() as u64,
                        "rate window full, waiting for it to roll"
                    );
                    tokio::time::sleep_until(opened + interval).await;
                }
                _ => {
                    self.opened_at = Some(now);
                    self.started = 1;
                    return;
                }
            }
        }
    }
}

struct Inner {
    settings: QueueSettings,
    admission: Mutex<Window>,
    slots: Arc<Semaphore>,
    active: AtomicUsize,
    pending: AtomicUsize,
    started_total: AtomicU64,
}

/// Decrements a counter when dropped, so cancelled callers never leak counts.
struct CountGuard<'a>(&'a AtomicUsize);

impl<'a> CountGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for CountGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Shared handle to the work queue. Cloning is cheap and shares the limits.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("settings", &self.inner.settings)
            .field("stats", &self.stats())
            .finish()
    }
}

impl WorkQueue {
    pub fn new(settings: QueueSettings) -> Self {
        let concurrency = settings.concurrency.max(1);
        Self {
            inner: Arc::new(Inner {
                settings,
                admission: Mutex::new(Window::default()),
                slots: Arc::new(Semaphore::new(concurrency)),
                active: AtomicUsize::new(0),
                pending: AtomicUsize::new(0),
                started_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn settings(&self) -> QueueSettings {
        self.inner.settings
    }

    /// Runs `task` once it is admitted and returns its result.
    ///
    /// A failing task only fails its own caller. A task exceeding the
    /// per-task timeout is dropped and reported as [`QueueError::TimedOut`].
    pub async fn submit<F, Fut, T, E>(&self, task: F) -> Result<T, QueueError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let inner = &self.inner;

        let permit = {
            let _pending = CountGuard::enter(&inner.pending);
            let mut window = inner.admission.lock().await;
            let permit = inner
                .slots
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| QueueError::Closed)?;
            window
                .admit(inner.settings.interval_cap, inner.settings.interval)
                .await;
            permit
        };

        let _active = CountGuard::enter(&inner.active);
        let started = inner.started_total.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            active = inner.active.load(Ordering::SeqCst),
            pending = inner.pending.load(Ordering::SeqCst),
            started_total = started,
            "queue task active"
        );

        let timeout = inner.settings.task_timeout;
        let outcome = tokio::time::timeout(timeout, task()).await;
        drop(permit);

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(QueueError::Task(e)),
            Err(_) => Err(QueueError::TimedOut(timeout)),
        }
    }

    /// Tasks currently running.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Tasks submitted but not yet started.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            active: self.active(),
            pending: self.pending(),
            started_total: self.inner.started_total.load(Ordering::SeqCst),
        }
    }

    /// Stops admitting tasks. Waiting callers receive [`QueueError::Closed`];
    /// running tasks finish normally.
    pub fn close(&self) {
        self.inner.slots.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn settings(concurrency: usize, interval_cap: usize) -> QueueSettings {
        QueueSettings {
            concurrency,
            interval_cap,
            interval: Duration::from_secs(60),
            task_timeout: Duration::from_secs(600),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn interval_cap_limits_starts_per_window() {
        let queue = WorkQueue::new(settings(10, 3));
        let starts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let t0 = Instant::now();

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = queue.clone();
            let starts = starts.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .submit(|| async move {
                        starts.lock().unwrap().push(Instant::now());
                        Ok::<_, &'static str>(i)
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let starts = starts.lock().unwrap();
        let first_window = starts
            .iter()
            .filter(|s| s.duration_since(t0) < Duration::from_secs(60))
            .count();
        assert_eq!(first_window, 3);
        assert!(
            starts
                .iter()
                .all(|s| s.duration_since(t0) < Duration::from_secs(120))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_start_in_submission_order() {
        let queue = WorkQueue::new(settings(1, 100));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = queue.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .submit(|| async move {
                        order.lock().unwrap().push(i);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok::<_, &'static str>(())
                    })
                    .await
            }));
            settle().await;
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_task_is_rejected_with_timeout() {
        let mut s = settings(1, 3);
        s.task_timeout = Duration::from_secs(5);
        let queue = WorkQueue::new(s);

        let result = queue
            .submit(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, &'static str>(())
            })
            .await;

        assert!(matches!(result, Err(QueueError::TimedOut(d)) if d == Duration::from_secs(5)));
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_task_does_not_affect_others() {
        let queue = WorkQueue::new(settings(1, 10));

        let failed = queue
            .submit(|| async { Err::<u32, _>("boom") })
            .await;
        let ok = queue.submit(|| async { Ok::<_, &'static str>(7) }).await;

        assert!(matches!(failed, Err(QueueError::Task("boom"))));
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn counters_track_active_and_pending() {
        let queue = WorkQueue::new(settings(1, 10));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let q = queue.clone();
        let first = tokio::spawn(async move {
            q.submit(|| async move {
                let _ = release_rx.await;
                Ok::<_, &'static str>(1)
            })
            .await
        });
        settle().await;

        let q = queue.clone();
        let second =
            tokio::spawn(async move { q.submit(|| async { Ok::<_, &'static str>(2) }).await });
        settle().await;

        assert_eq!(queue.active(), 1);
        assert_eq!(queue.pending(), 1);

        release_tx.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert_eq!(second.await.unwrap().unwrap(), 2);

        let stats = queue.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.started_total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_queue_rejects_new_tasks() {
        let queue = WorkQueue::new(settings(1, 10));
        queue.close();
        let result = queue.submit(|| async { Ok::<_, &'static str>(()) }).await;
        assert!(matches!(result, Err(QueueError::Closed)));
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn settings_from_config() {
        let config = QueueConfig::default();
        let s = QueueSettings::from(&config);
        assert_eq!(s.concurrency, 1);
        assert_eq!(s.interval_cap, 3);
        assert_eq!(s.interval, Duration::from_secs(60));
        assert_eq!(s.task_timeout, Duration::from_secs(600));
    }
}
