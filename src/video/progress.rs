//! Rotating progress messages shown while a job runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Callback receiving human-readable progress messages.
pub type ProgressFn = dyn Fn(&str) + Send + Sync;

/// Messages cycled through while waiting for a job.
pub const PROGRESS_MESSAGES: [&str; 7] = [
    "Summoning digital spirits...",
    "Teaching pixels to dance...",
    "Composing a symphony of light and code...",
    "Warming up the creativity engine...",
    "Polishing the final frames...",
    "Rendering your masterpiece...",
    "This might take a few moments...",
];

/// Background task emitting one of [`PROGRESS_MESSAGES`] per period.
///
/// Once [`ProgressTicker::stop`] returns, the callback is never invoked
/// again. Dropping the ticker without stopping it also cancels the task.
pub(crate) struct ProgressTicker {
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Starts ticking. The first message is emitted one `period` from now.
    /// A zero period starts nothing.
    pub(crate) fn start(period: Duration, on_progress: Arc<ProgressFn>) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        if period.is_zero() {
            return Self {
                stopped,
                handle: None,
            };
        }

        let flag = Arc::clone(&stopped);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index = 0;
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                on_progress(PROGRESS_MESSAGES[index]);
                index = (index + 1) % PROGRESS_MESSAGES.len();
            }
        });

        Self {
            stopped,
            handle: Some(handle),
        }
    }

    /// Cancels the task and waits for it to finish.
    pub(crate) async fn stop(mut self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancelled is the expected outcome; a panic in the callback is
            // not worth failing the job over.
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::warn!("progress callback panicked");
                }
            }
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
