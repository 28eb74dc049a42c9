//! In-process worker supervision
//!
//! Each site worker runs as a tokio task holding a [`WorkerLease`]. The
//! lease owns a permit from the global worker semaphore and the site's
//! registry entry; dropping it frees both, so a worker that returns early,
//! fails, or panics never keeps its slot.

use crate::crawler::signal::{stop_channel, StopHandle, StopSignal};
use futures::future::{join_all, BoxFuture};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

/// Result of asking the supervisor to start a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    AtCapacity,
}

/// The supervision operations the scheduler relies on
pub trait WorkerSupervisor: Send + Sync {
    /// Number of live workers
    fn active_count(&self) -> usize;

    fn is_running(&self, domain: &str) -> bool;

    /// Starts a worker bound to `domain`
    fn start(&self, domain: &str) -> StartOutcome;

    /// Asks the worker for `domain` to stop; returns `false` if none is running
    fn stop(&self, domain: &str) -> bool;
}

/// Body of a supervised worker
pub type WorkerLauncher = Arc<dyn Fn(WorkerLease) -> BoxFuture<'static, ()> + Send + Sync>;

struct WorkerEntry {
    id: u64,
    stop: StopHandle,
    handle: Option<JoinHandle<()>>,
}

type Registry = Arc<Mutex<HashMap<String, WorkerEntry>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<String, WorkerEntry>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running worker's claim on its domain and on one concurrency slot
pub struct WorkerLease {
    domain: String,
    id: u64,
    stop: StopSignal,
    registry: Registry,
    _permit: OwnedSemaphorePermit,
}

impl WorkerLease {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Fires when the supervisor asks this worker to stop
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Ends supervision of this worker
    pub fn release(self) {}
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        let mut workers = lock(&self.registry);
        // A newer worker may own the entry if this one was replaced
        if workers.get(&self.domain).map(|e| e.id) == Some(self.id) {
            workers.remove(&self.domain);
        }
        tracing::trace!("Released worker slot for {}", self.domain);
    }
}

/// Supervises site workers as tokio tasks under a global cap
pub struct TaskSupervisor {
    semaphore: Arc<Semaphore>,
    registry: Registry,
    launcher: WorkerLauncher,
    next_id: AtomicU64,
}

impl TaskSupervisor {
    pub fn new(max_workers: usize, launcher: WorkerLauncher) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_workers)),
            registry: Arc::new(Mutex::new(HashMap::new())),
            launcher,
            next_id: AtomicU64::new(1),
        }
    }

    /// Domains with a live worker
    pub fn running_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = lock(&self.registry).keys().cloned().collect();
        domains.sort();
        domains
    }

    /// Stops every worker and waits for their tasks to finish
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut workers = lock(&self.registry);
            workers
                .values_mut()
                .filter_map(|entry| {
                    entry.stop.stop();
                    entry.handle.take()
                })
                .collect()
        };

        tracing::info!("Waiting for {} workers to stop", handles.len());
        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!("Worker task ended abnormally: {}", e);
            }
        }
    }
}

impl WorkerSupervisor for TaskSupervisor {
    fn active_count(&self) -> usize {
        lock(&self.registry).len()
    }

    fn is_running(&self, domain: &str) -> bool {
        lock(&self.registry).contains_key(domain)
    }

    fn start(&self, domain: &str) -> StartOutcome {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (stop, signal) = stop_channel();

        let lease = {
            let mut workers = lock(&self.registry);
            if workers.contains_key(domain) {
                return StartOutcome::AlreadyRunning;
            }
            let permit = match self.semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => return StartOutcome::AtCapacity,
            };
            workers.insert(
                domain.to_string(),
                WorkerEntry {
                    id,
                    stop,
                    handle: None,
                },
            );
            WorkerLease {
                domain: domain.to_string(),
                id,
                stop: signal,
                registry: self.registry.clone(),
                _permit: permit,
            }
        };

        let handle = tokio::spawn((self.launcher)(lease));

        // The task may already be done and gone from the registry
        if let Some(entry) = lock(&self.registry).get_mut(domain) {
            if entry.id == id {
                entry.handle = Some(handle);
            }
        }

        tracing::debug!("Started worker for {}", domain);
        StartOutcome::Started
    }

    fn stop(&self, domain: &str) -> bool {
        match lock(&self.registry).get(domain) {
            Some(entry) => {
                entry.stop.stop();
                true
            }
            None => false,
        }
    }
}
