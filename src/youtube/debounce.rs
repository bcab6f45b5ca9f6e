// Debounced task scheduling for search-as-you-type
//
// Every keystroke reschedules the fetch: a task that hasn't fired yet is
// cancelled when a newer one arrives. Once a task fires it runs detached,
// so a later keystroke never cancels a request already on the wire; the
// generation token lets that request notice it went stale.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Identifies one scheduled task. Stale once anything newer was scheduled.
#[derive(Debug, Clone)]
pub struct Generation {
    value: u64,
    latest: Arc<AtomicU64>,
}

impl Generation {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.value
    }
}

#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    latest: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Debouncer {
            quiet_period,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Replaces any pending task with `task`, to run after the quiet period.
    pub fn schedule<F, Fut>(&mut self, task: F) -> Generation
    where
        F: FnOnce(Generation) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel_pending();

        let value = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Generation {
            value,
            latest: Arc::clone(&self.latest),
        };

        let quiet_period = self.quiet_period;
        let token = generation.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // Detach the work itself; aborting `pending` from here on is harmless
            tokio::spawn(task(token));
        }));

        generation
    }

    /// Drops the pending task (if it hasn't fired) and marks everything stale.
    pub fn cancel(&mut self) {
        self.cancel_pending();
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> Arc<Mutex<Vec<u64>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    async fn settle() {
        // Let spawned tasks run to completion
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_keystroke_fires() {
        let fired = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            debouncer.schedule(move |generation| async move {
                fired.lock().unwrap().push(generation.value());
            });
            settle().await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;

        assert_eq!(*fired.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_the_quiet_period() {
        let fired = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let sink = Arc::clone(&fired);
        debouncer.schedule(move |generation| async move {
            sink.lock().unwrap().push(generation.value());
        });
        settle().await;

        tokio::time::advance(Duration::from_millis(299)).await;
        settle().await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::advance(Duration::from_millis(5)).await;
        settle().await;
        assert_eq!(fired.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_schedule_marks_in_flight_work_stale() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let first = debouncer.schedule(|_| async {});
        assert!(first.is_current());

        let second = debouncer.schedule(|_| async {});
        assert!(!first.is_current());
        assert!(second.is_current());

        debouncer.cancel();
        assert!(!second.is_current());
    }
}
