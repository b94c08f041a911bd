//! Progress sinks notified as rows finish.
//!
//! A render reports one unit per completed row plus one final unit once the
//! image is assembled, so a sink sees `image_height + 1` units in total.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Receives progress from render workers; called concurrently.
pub trait Progress: Send + Sync {
    fn advance(&self, units: u64);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&self, _units: u64) {}
}

/// Counts units with an atomic counter.
#[derive(Debug, Default)]
pub struct CountingProgress {
    done: AtomicU64,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

impl Progress for CountingProgress {
    fn advance(&self, units: u64) {
        self.done.fetch_add(units, Ordering::Relaxed);
    }
}

/// Logs completion percentage at info level whenever it crosses a step.
#[derive(Debug)]
pub struct LogProgress {
    total: u64,
    step_percent: u64,
    done: AtomicU64,
}

impl LogProgress {
    /// `total` units expected, logging every `step_percent` percent.
    pub fn new(total: u64, step_percent: u64) -> Self {
        Self {
            total: total.max(1),
            step_percent: step_percent.clamp(1, 100),
            done: AtomicU64::new(0),
        }
    }
}

impl Progress for LogProgress {
    fn advance(&self, units: u64) {
        let before = self.done.fetch_add(units, Ordering::Relaxed);
        let after = before + units;

        let step = |done: u64| (done.min(self.total) * 100 / self.total) / self.step_percent;
        if step(after) > step(before) {
            log::info!("Render progress: {}%", after.min(self.total) * 100 / self.total);
        }
    }
}

/// Forwards units over a channel, e.g. to a UI thread.
///
/// The sender is wrapped in a mutex so the sink can be shared by workers.
#[derive(Debug)]
pub struct ChannelProgress {
    sender: Mutex<Sender<u64>>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<u64>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl Progress for ChannelProgress {
    fn advance(&self, units: u64) {
        // A poisoned lock or dropped receiver only loses progress updates
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(units);
        }
    }
}
