//! Scheduler for dispatching site workers
//!
//! This module handles:
//! - Polling the task queue at a fixed interval
//! - Enforcing the global worker cap
//! - Keeping at most one live worker per domain
//!
//! Every tick re-checks the supervisor, so a queue snapshot that went stale
//! between listing and dispatch only ever causes a skip on the next tick.

use crate::config::SchedulerConfig;
use crate::crawler::signal::StopSignal;
use crate::crawler::supervisor::{StartOutcome, WorkerSupervisor};
use crate::storage::TaskQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// What a tick does with one pending domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchDecision {
    Dispatch,
    SkipRunning,
    SkipAwaitingDiscovery,
    SkipCapacity,
}

/// Decides the action for one pending domain
///
/// # Arguments
///
/// * `running` - Whether a worker for this domain is alive
/// * `active` - Live worker count
/// * `cap` - Configured worker cap
/// * `job_ready` - Whether the job already carries category URLs
pub fn decide(running: bool, active: usize, cap: usize, job_ready: bool) -> DispatchDecision {
    if running {
        DispatchDecision::SkipRunning
    } else if !job_ready {
        DispatchDecision::SkipAwaitingDiscovery
    } else if active >= cap {
        DispatchDecision::SkipCapacity
    } else {
        DispatchDecision::Dispatch
    }
}

/// Counts for one scheduler tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub pending: usize,
    pub dispatched: usize,
    pub skipped_running: usize,
    pub skipped_awaiting: usize,
    pub skipped_capacity: usize,
    pub errors: usize,
}

impl TickReport {
    fn record(&mut self, decision: DispatchDecision) {
        match decision {
            DispatchDecision::Dispatch => self.dispatched += 1,
            DispatchDecision::SkipRunning => self.skipped_running += 1,
            DispatchDecision::SkipAwaitingDiscovery => self.skipped_awaiting += 1,
            DispatchDecision::SkipCapacity => self.skipped_capacity += 1,
        }
    }
}

/// Polls the queue and dispatches workers through the supervisor
pub struct Scheduler {
    queue: Arc<dyn TaskQueue>,
    supervisor: Arc<dyn WorkerSupervisor>,
    max_workers: usize,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        supervisor: Arc<dyn WorkerSupervisor>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            queue,
            supervisor,
            max_workers: config.max_concurrent_workers as usize,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Processes every pending domain once, in queue order
    ///
    /// A failure on one domain is logged and counted; the tick moves on.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let pending = match self.queue.list_pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!("Failed to list pending jobs: {}", e);
                report.errors += 1;
                return report;
            }
        };
        report.pending = pending.len();

        for domain in &pending {
            let running = self.supervisor.is_running(domain);
            let job_ready = if running {
                true
            } else {
                match self.queue.read_job(domain) {
                    Ok(job) => !job.is_awaiting_discovery(),
                    // Removed since the listing
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => {
                        tracing::warn!("Failed to read job for {}: {}", domain, e);
                        report.errors += 1;
                        continue;
                    }
                }
            };

            let decision = decide(
                running,
                self.supervisor.active_count(),
                self.max_workers,
                job_ready,
            );

            let decision = if decision == DispatchDecision::Dispatch {
                match self.supervisor.start(domain) {
                    StartOutcome::Started => {
                        tracing::info!("Dispatched worker for {}", domain);
                        DispatchDecision::Dispatch
                    }
                    StartOutcome::AlreadyRunning => DispatchDecision::SkipRunning,
                    StartOutcome::AtCapacity => DispatchDecision::SkipCapacity,
                }
            } else {
                decision
            };

            tracing::trace!("{}: {:?}", domain, decision);
            report.record(decision);
        }

        report
    }

    /// Ticks at the poll interval until `shutdown` fires
    pub async fn run(&self, shutdown: StopSignal) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Scheduler started (poll every {:?}, max {} workers)",
            self.poll_interval,
            self.max_workers
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.stopped() => break,
            }

            let report = self.tick();
            if report.pending > 0 {
                tracing::info!(
                    "Tick: {} pending, {} dispatched, {} running, {} awaiting discovery, {} at capacity, {} errors",
                    report.pending,
                    report.dispatched,
                    report.skipped_running,
                    report.skipped_awaiting,
                    report.skipped_capacity,
                    report.errors
                );
            }
        }

        tracing::info!("Scheduler stopped");
    }
}
