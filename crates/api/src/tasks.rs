//! Background work spawned by request handlers.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;

/// Tracks tasks that outlive the request that spawned them, so shutdown
/// can wait for them instead of dropping them mid-send.
#[derive(Default)]
pub struct BackgroundTasks {
    set: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` and reaps tasks that already finished.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.lock();
        while let Some(finished) = set.try_join_next() {
            report(finished);
        }
        set.spawn(task);
    }

    /// Number of tracked tasks, finished ones not yet reaped included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Waits for every tracked task, including tasks spawned while waiting.
    /// Returns how many tasks were awaited.
    pub async fn drain(&self) -> usize {
        let mut drained = 0;
        loop {
            let mut set = std::mem::take(&mut *self.lock());
            if set.is_empty() {
                return drained;
            }
            while let Some(finished) = set.join_next().await {
                drained += 1;
                report(finished);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn report(finished: Result<(), tokio::task::JoinError>) {
    if let Err(err) = finished {
        tracing::error!(error = %err, "background task failed");
        metrics::counter!("background_tasks_failed_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn drain_waits_for_running_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));
        for i in 0..4 {
            let done = Arc::clone(&done);
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(tasks.len(), 4);

        assert_eq!(tasks.drain().await, 4);
        assert_eq!(done.load(Ordering::SeqCst), 4);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn finished_tasks_are_reaped_on_spawn() {
        let tasks = BackgroundTasks::new();
        tasks.spawn(async {});
        tokio::time::sleep(Duration::from_millis(20)).await;

        tasks.spawn(std::future::pending());
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn panicking_task_does_not_stop_drain() {
        let tasks = BackgroundTasks::new();
        tasks.spawn(async { panic!("boom") });
        tasks.spawn(async {});

        assert_eq!(tasks.drain().await, 2);
    }

    #[tokio::test]
    async fn drain_on_empty_returns_immediately() {
        assert_eq!(BackgroundTasks::new().drain().await, 0);
    }
}
