//! Cancellable periodic task on the tokio clock.
//!
//! Ticks follow `tokio::time`, so tests drive them with a paused clock
//! (`#[tokio::test(start_paused = true)]` + `tokio::time::advance`).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to a running periodic task.
///
/// The first tick fires one full `period` after spawning, never
/// immediately. Ticks run one at a time: a handler slower than the period
/// delays the next tick instead of overlapping it. Dropping the handle
/// aborts the task.
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl PeriodicTask {
    /// Spawn `on_tick` every `period` on the current tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::SeqCst);
                on_tick().await;
            }
        });

        tracing::debug!(task = name, period_ms = period.as_millis() as u64, "Periodic task started");

        Self {
            name,
            period,
            handle: Some(handle),
            ticks,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the task and wait until it has fully stopped.
    ///
    /// Once this returns no tick handler is running or will run again,
    /// including one that was mid-flight on another worker thread.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            tracing::debug!(task = self.name, ticks = self.ticks(), "Periodic task stopped");
        }
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(task = self.name, "Periodic task aborted");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(3_000);

    fn counting_task() -> (PeriodicTask, Arc<AtomicU64>) {
        let runs = Arc::new(AtomicU64::new(0));
        let r = runs.clone();
        let task = PeriodicTask::spawn("test", PERIOD, move || {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, runs)
    }

    /// Let spawned tasks observe the current (paused) time.
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let (task, runs) = counting_task();
        settle().await;
        tokio::time::advance(PERIOD - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(task.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (task, runs) = counting_task();
        settle().await;
        for expected in 1..=4 {
            tokio::time::advance(PERIOD).await;
            settle().await;
            assert_eq!(runs.load(Ordering::SeqCst), expected);
        }
        assert_eq!(task.ticks(), 4);
        assert_eq!(task.period(), PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_future_ticks() {
        let (task, runs) = counting_task();
        settle().await;
        tokio::time::advance(PERIOD).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        task.shutdown().await;
        for _ in 0..10 {
            tokio::time::advance(PERIOD).await;
            settle().await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_task() {
        let (task, runs) = counting_task();
        drop(task);
        for _ in 0..10 {
            tokio::time::advance(PERIOD).await;
            settle().await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_does_not_overlap() {
        let running = Arc::new(AtomicU64::new(0));
        let max_seen = Arc::new(AtomicU64::new(0));
        let (r, m) = (running.clone(), max_seen.clone());

        let task = PeriodicTask::spawn("slow", PERIOD, move || {
            let (r, m) = (r.clone(), m.clone());
            async move {
                let now = r.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(PERIOD * 2).await;
                r.fetch_sub(1, Ordering::SeqCst);
            }
        });

        settle().await;
        for _ in 0..10 {
            tokio::time::advance(PERIOD).await;
            settle().await;
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(task.ticks() >= 2);
    }
}
