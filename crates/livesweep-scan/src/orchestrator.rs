//! Scan orchestration.
//!
//! A fixed pool of tokio worker tasks pulls targets from a shared queue and
//! probes them. Outcomes come back over an mpsc channel to a single
//! collector, which is the only place scan state is mutated. The collector
//! stops on completion, on the cancel future, or when the pool dies, and
//! every one of those paths ends in exactly one call to the result sink.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

use livesweep_core::{LiveEntry, ProbeOutcome, ProbeTarget};

use crate::config::SweepConfig;
use crate::error::Result;
use crate::prober::{hard_deadline, Prober};
use crate::progress::{should_report, ProgressReporter, ProgressUpdate};
use crate::sink::ResultSink;

/// Knobs for a single scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Number of worker tasks, each running one probe at a time.
    pub concurrency: usize,
    /// Timeout handed to the prober. The orchestrator additionally enforces
    /// [`hard_deadline`] of this value.
    pub probe_timeout: Duration,
    /// Report progress every this many outcomes.
    pub progress_every: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: 50,
            probe_timeout: Duration::from_millis(700),
            progress_every: 50,
        }
    }
}

impl From<&SweepConfig> for ScanSettings {
    fn from(config: &SweepConfig) -> Self {
        Self {
            concurrency: config.max_workers,
            probe_timeout: config.probe_timeout(),
            progress_every: config.progress_every,
        }
    }
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// Every target produced an outcome.
    Completed,
    /// The cancel future fired first.
    Cancelled,
    /// The collector lost contact with the worker pool.
    Failed(String),
}

/// Summary of a finished (or interrupted) scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub total: usize,
    pub processed: usize,
    pub live: Vec<LiveEntry>,
    pub termination: Termination,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ScanReport {
    pub fn was_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Aggregate state of a running scan. Owned by the collector alone.
struct ScanState {
    scan_id: Uuid,
    total: usize,
    processed: usize,
    live: Vec<LiveEntry>,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl ScanState {
    fn new(total: usize) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            total,
            processed: 0,
            live: Vec::new(),
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    fn record(&mut self, outcome: ProbeOutcome) -> ProgressUpdate {
        self.processed += 1;
        if outcome.alive {
            self.live.push(outcome.target.into());
        }
        ProgressUpdate {
            processed: self.processed,
            total: self.total,
            address: outcome.target.address,
            alive: outcome.alive,
            elapsed: self.clock.elapsed(),
        }
    }

    fn finish(self, termination: Termination) -> ScanReport {
        ScanReport {
            scan_id: self.scan_id,
            total: self.total,
            processed: self.processed,
            live: self.live,
            termination,
            started_at: self.started_at,
            finished_at: Utc::now(),
            elapsed_ms: self.clock.elapsed().as_millis() as u64,
        }
    }
}

type TargetQueue = Arc<Mutex<std::vec::IntoIter<ProbeTarget>>>;

/// Runs probes across a bounded worker pool and persists what it finds.
pub struct ScanOrchestrator {
    settings: ScanSettings,
    prober: Arc<dyn Prober>,
    sink: Arc<dyn ResultSink>,
}

impl ScanOrchestrator {
    pub fn new(settings: ScanSettings, prober: Arc<dyn Prober>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            settings,
            prober,
            sink,
        }
    }

    /// Probe every target and persist the live ones.
    ///
    /// `cancel` resolving stops the scan: queued targets are dropped,
    /// in-flight probes are no longer awaited, and whatever has been
    /// collected is persisted. Cancellation is reported through
    /// [`ScanReport::termination`], not as an error. The only error this
    /// returns is a failure to persist.
    pub async fn run<C>(
        &self,
        targets: Vec<ProbeTarget>,
        reporter: &mut dyn ProgressReporter,
        cancel: C,
    ) -> Result<ScanReport>
    where
        C: Future<Output = ()>,
    {
        let mut state = ScanState::new(targets.len());

        tracing::info!(
            scan_id = %state.scan_id,
            total = state.total,
            concurrency = self.settings.concurrency,
            probe_timeout_ms = self.settings.probe_timeout.as_millis() as u64,
            "Starting sweep"
        );

        let (mut pool, mut outcomes) = self.spawn_pool(targets);
        let termination = self
            .collect(&mut state, &mut outcomes, reporter, cancel)
            .await;

        // Queued targets never start; running probes are abandoned.
        pool.abort_all();
        drop(outcomes);

        let report = state.finish(termination);
        log_termination(&report);

        if let Err(e) = self.sink.persist(&report.live) {
            tracing::error!(
                scan_id = %report.scan_id,
                live = report.live.len(),
                error = %e,
                "Failed to persist results"
            );
            return Err(e);
        }

        Ok(report)
    }

    fn spawn_pool(
        &self,
        targets: Vec<ProbeTarget>,
    ) -> (JoinSet<()>, mpsc::Receiver<ProbeOutcome>) {
        let workers = self.settings.concurrency.clamp(1, targets.len().max(1));
        let (tx, rx) = mpsc::channel(workers);
        let mut pool = JoinSet::new();

        if targets.is_empty() {
            return (pool, rx);
        }

        let queue: TargetQueue = Arc::new(Mutex::new(targets.into_iter()));
        for _ in 0..workers {
            let queue = queue.clone();
            let tx = tx.clone();
            let prober = self.prober.clone();
            let timeout = self.settings.probe_timeout;

            pool.spawn(async move {
                while let Some(target) = next_target(&queue) {
                    let alive = probe_bounded(prober.clone(), target.address, timeout).await;
                    if tx.send(ProbeOutcome { target, alive }).await.is_err() {
                        break;
                    }
                }
            });
        }

        (pool, rx)
    }

    async fn collect<C>(
        &self,
        state: &mut ScanState,
        outcomes: &mut mpsc::Receiver<ProbeOutcome>,
        reporter: &mut dyn ProgressReporter,
        cancel: C,
    ) -> Termination
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        while state.processed < state.total {
            tokio::select! {
                biased;

                () = &mut cancel => return Termination::Cancelled,

                next = outcomes.recv() => match next {
                    Some(outcome) => {
                        let update = state.record(outcome);
                        if should_report(update.processed, update.alive, self.settings.progress_every) {
                            reporter.observe(&update);
                        }
                    }
                    None => {
                        return Termination::Failed(format!(
                            "worker pool stopped after {} of {} outcomes",
                            state.processed, state.total
                        ));
                    }
                },
            }
        }

        Termination::Completed
    }
}

fn next_target(queue: &Mutex<std::vec::IntoIter<ProbeTarget>>) -> Option<ProbeTarget> {
    // A poisoned queue means a worker panicked mid-pop; stop pulling.
    queue.lock().ok()?.next()
}

/// Run one probe in its own task under the hard deadline. Panics and
/// deadline overruns both count as not alive.
async fn probe_bounded(prober: Arc<dyn Prober>, addr: Ipv4Addr, timeout: Duration) -> bool {
    let handle = tokio::spawn(async move { prober.probe(addr, timeout).await });
    let abort = handle.abort_handle();

    match tokio::time::timeout(hard_deadline(timeout), handle).await {
        Ok(Ok(alive)) => alive,
        Ok(Err(e)) => {
            tracing::warn!(address = %addr, error = %e, "Probe task failed");
            false
        }
        Err(_) => {
            abort.abort();
            tracing::debug!(address = %addr, "Probe exceeded hard deadline");
            false
        }
    }
}

fn log_termination(report: &ScanReport) {
    match &report.termination {
        Termination::Completed => tracing::info!(
            scan_id = %report.scan_id,
            processed = report.processed,
            live = report.live.len(),
            duration_ms = report.elapsed_ms,
            "Sweep complete"
        ),
        Termination::Cancelled => tracing::warn!(
            scan_id = %report.scan_id,
            processed = report.processed,
            total = report.total,
            live = report.live.len(),
            "Sweep interrupted, saving partial results"
        ),
        Termination::Failed(reason) => tracing::error!(
            scan_id = %report.scan_id,
            processed = report.processed,
            total = report.total,
            live = report.live.len(),
            reason = %reason,
            "Sweep aborted, saving partial results"
        ),
    }
}
