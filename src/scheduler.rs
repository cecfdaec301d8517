//! # Poll Scheduler Module
//!
//! Repeating fetch/compute cycles for the dashboard views.
//!
//! Each `PollScheduler` runs on a dedicated thread with its own Tokio runtime
//! so a slow source never blocks the caller. Cycles are strictly sequential:
//! the next tick is only awaited after the previous job has returned, and
//! missed ticks are delayed rather than burst.
//!
//! ## Key Components
//! - `PollScheduler`: owns the worker thread and its cancellation handle
//! - `PollUpdate`: one cycle's result, stamped with a process-wide sequence
//!   number so receivers can drop stale results
//!
//! Dropping a scheduler cancels it and joins the worker.

use crate::error::SchedulerError;
use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    NEXT_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Result of one poll cycle
#[derive(Debug, Clone)]
pub struct PollUpdate<T> {
    pub seq: u64,
    pub issued_at: DateTime<Utc>,
    pub value: T,
}

/// Cancellable repeating task
pub struct PollScheduler {
    name: String,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl PollScheduler {
    /// Starts running `job` every `period`, the first cycle immediately.
    ///
    /// The loop ends on `cancel`, on drop, or once `sender`'s receiver is gone.
    pub fn start<T, F>(
        name: &str,
        period: Duration,
        mut job: F,
        sender: Sender<PollUpdate<T>>,
    ) -> Result<Self, SchedulerError>
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        let rt = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| SchedulerError::RuntimeCreation(e.to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let thread_stop = stop.clone();
        let thread_wake = wake.clone();
        let thread_name = name.to_string();

        let handle = std::thread::Builder::new()
            .name(format!("poll-{}", name))
            .spawn(move || {
                let loop_name = thread_name.clone();
                rt.block_on(async move {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                    loop {
                        tokio::select! {
                            _ = interval.tick() => {}
                            _ = thread_wake.notified() => {}
                        }
                        if thread_stop.load(Ordering::Relaxed) {
                            break;
                        }

                        let seq = next_seq();
                        let issued_at = Utc::now();
                        let value = job();

                        if sender.send(PollUpdate { seq, issued_at, value }).is_err() {
                            log::debug!("Poll {}: receiver dropped", loop_name);
                            break;
                        }
                    }
                });
                log::info!("Poll {}: stopped", thread_name);
            })
            .map_err(|e| SchedulerError::ThreadSpawn(e.to_string()))?;

        log::info!("Poll {}: started every {:?}", name, period);

        Ok(Self {
            name: name.to_string(),
            stop,
            wake,
            handle: Some(handle),
        })
    }

    /// Requests the loop to stop. A cycle already running completes first.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
        // notify_one stores a permit, so a wake before the loop awaits is not lost
        self.wake.notify_one();
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Poll {}: worker panicked", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_first_cycle_runs_immediately() {
        let (tx, rx) = unbounded();
        let scheduler =
            PollScheduler::start("first", Duration::from_secs(60), || 7, tx).unwrap();

        let update = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(update.value, 7);
        assert!(update.seq >= 1);
        drop(scheduler);
    }

    #[test]
    fn test_sequence_increases() {
        let (tx, rx) = unbounded();
        let _scheduler =
            PollScheduler::start("seq", Duration::from_millis(10), || (), tx).unwrap();

        let a = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let b = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(b.seq > a.seq);
        assert!(b.issued_at >= a.issued_at);
    }

    #[test]
    fn test_drop_stops_job() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let (tx, rx) = unbounded();

        let scheduler = PollScheduler::start(
            "drop",
            Duration::from_millis(5),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            tx,
        )
        .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        drop(scheduler);

        let after_drop = runs.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_cancel_wakes_sleeping_loop() {
        let (tx, rx) = unbounded();
        let scheduler =
            PollScheduler::start("cancel", Duration::from_secs(3600), || 1u8, tx).unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        scheduler.cancel();

        // join returns promptly instead of waiting out the hour-long period
        drop(scheduler);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stops_when_receiver_dropped() {
        let (tx, rx) = unbounded::<PollUpdate<u8>>();
        drop(rx);
        let scheduler =
            PollScheduler::start("orphan", Duration::from_millis(5), || 0u8, tx).unwrap();
        drop(scheduler);
    }
}
