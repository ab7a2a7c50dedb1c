//! Cancellable fixed-period task.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

struct ActivePoll {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs a task every `period` until stopped.
///
/// The first run happens immediately on start. Runs never overlap: the loop
/// awaits each run before waiting for the next tick, and ticks missed while a
/// run was in progress are skipped. Stopping cancels the pending tick; a run
/// already in progress is allowed to finish.
pub struct PollScheduler {
    period: Duration,
    active: Option<ActivePoll>,
}

impl PollScheduler {
    /// Create a stopped scheduler.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a poll loop is running.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Start running `task` every period. Returns false if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, mut task: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => task().await,
                }
            }
            debug!("Poll loop exited");
        });

        self.active = Some(ActivePoll { stop_tx, handle });
        true
    }

    /// Stop the poll loop. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                let _ = active.stop_tx.send(());
                !active.handle.is_finished()
            }
            None => false,
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(
        counter: Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new(Duration::from_secs(5));

        assert!(scheduler.start(counting_task(runs.clone())));
        // Offset by a millisecond so every check lands between ticks.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new(Duration::from_secs(5));

        assert!(scheduler.start(counting_task(runs.clone())));
        assert!(!scheduler.start(counting_task(runs.clone())));
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_ticks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new(Duration::from_secs(5));

        scheduler.start(counting_task(runs.clone()));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(scheduler.stop());
        assert!(!scheduler.is_running());
        assert!(!scheduler.stop());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_do_not_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let mut scheduler = PollScheduler::new(Duration::from_secs(1));

        scheduler.start({
            let in_flight = in_flight.clone();
            let max_in_flight = max_in_flight.clone();
            move || {
                let in_flight = in_flight.clone();
                let max_in_flight = max_in_flight.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    // Slower than the period.
                    tokio::time::sleep(Duration::from_millis(2_500)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            }
        });

        tokio::time::sleep(Duration::from_secs(20)).await;
        scheduler.stop();
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }
}
