//! Progress reporting for a running sweep.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Snapshot handed to a [`ProgressReporter`] after an outcome is recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub address: Ipv4Addr,
    pub alive: bool,
    pub elapsed: Duration,
}

impl ProgressUpdate {
    /// Addresses processed per second so far.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {} -> {}  (rate {:.1} ip/s)",
            self.processed,
            self.total,
            self.address,
            if self.alive { "LIVE" } else { "dead" },
            self.rate()
        )
    }
}

/// Whether an update is worth reporting: every `every`th item, and every
/// live host as soon as it is found.
pub fn should_report(processed: usize, alive: bool, every: usize) -> bool {
    alive || (every > 0 && processed % every == 0)
}

/// Observer of scan progress. Has no influence on the scan itself.
pub trait ProgressReporter: Send {
    fn observe(&mut self, update: &ProgressUpdate);
}

/// Reports through `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn observe(&mut self, update: &ProgressUpdate) {
        tracing::info!(
            processed = update.processed,
            total = update.total,
            address = %update.address,
            alive = update.alive,
            rate = update.rate(),
            "{update}"
        );
    }
}

/// Discards all updates.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn observe(&mut self, _update: &ProgressUpdate) {}
}
