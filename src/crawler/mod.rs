//! Crawler module for the site-level crawl pipeline
//!
//! This module contains the core crawling logic, including:
//! - Batched pagination over one category
//! - The resumable per-site worker
//! - Worker supervision and dispatch scheduling
//! - Category discovery for newly queued sites
//! - Overall service coordination

mod coordinator;
mod discovery;
mod engine;
mod scheduler;
mod signal;
mod supervisor;
mod worker;

pub use coordinator::{build_worker, Coordinator};
pub use discovery::{CategoryDiscovery, DiscoveryReport};
pub use engine::{CategoryResult, PaginatedCrawlEngine};
pub use scheduler::{decide, DispatchDecision, Scheduler, TickReport};
pub use signal::{stop_channel, StopHandle, StopSignal};
pub use supervisor::{StartOutcome, TaskSupervisor, WorkerLauncher, WorkerLease, WorkerSupervisor};
pub use worker::{CrawlWorker, WorkerOutcome, WorkerSettings};

use crate::config::Config;

/// Runs the crawl service until `shutdown` fires
///
/// This is the main entry point for the long-running service. It will:
/// 1. Open the configured storage backend
/// 2. Build the HTTP renderer
/// 3. Start the scheduler and discovery loops
/// 4. Serve the API if configured
/// 5. Stop every worker on shutdown
pub async fn run_service(config: Config, shutdown: StopSignal) -> crate::Result<()> {
    Coordinator::new(config)?.run(shutdown).await
}
