//! Cooperative pause/stop signalling shared by the discovery and fetch tasks.
//!
//! Both flags have a single writer (the pipeline controller) and many
//! readers. Readers poll rather than block on a notification, so pause and
//! resume propagate with at most [`PAUSE_POLL_INTERVAL`] of latency; that
//! staleness window is acceptable for this domain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Poll interval for the pause flag.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Shared pause/stop flags for one pipeline run.
#[derive(Debug, Default)]
pub struct ControlSignals {
    paused: AtomicBool,
    stopped: AtomicBool,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Request a graceful stop. Also clears the pause flag so a paused run
    /// can drain instead of hanging in its pause loops.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Suspends the caller while the pause flag is set. Returns once the flag
    /// clears or a stop is requested. This is the only suspension point that
    /// pause affects; work already in flight is never interrupted.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stopped() {
            tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
        }
    }
}
