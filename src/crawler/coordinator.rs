//! Crawler coordinator - service wiring and lifetime
//!
//! This module assembles the long-running service:
//! - Opening storage and the page renderer
//! - Building the worker, supervisor, scheduler and discovery loop
//! - Optionally serving the producer API
//! - Stopping everything cleanly on shutdown

use crate::api::{self, AppState};
use crate::config::Config;
use crate::crawler::discovery::CategoryDiscovery;
use crate::crawler::engine::PaginatedCrawlEngine;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::signal::StopSignal;
use crate::crawler::supervisor::{TaskSupervisor, WorkerLauncher, WorkerLease};
use crate::crawler::worker::{CrawlWorker, WorkerSettings};
use crate::extraction::{AdaptiveSelector, LinkClassifier, LinkExtractor};
use crate::render::{HttpRenderer, PageRenderer};
use crate::storage::{open_storage, StorageHandles};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

/// Main coordinator owning every long-running component
pub struct Coordinator {
    config: Arc<Config>,
    storage: StorageHandles,
    supervisor: Arc<TaskSupervisor>,
    scheduler: Arc<Scheduler>,
    discovery: Option<Arc<CategoryDiscovery>>,
}

impl Coordinator {
    /// Creates a coordinator from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated service configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage and renderer are ready
    /// * `Err(CrawlError)` - Storage could not be opened or the HTTP client failed to build
    pub fn new(config: Config) -> crate::Result<Self> {
        let storage = open_storage(&config.storage)?;
        let renderer = Arc::new(HttpRenderer::from_config(&config.user_agent)?);
        Ok(Self::with_parts(config, storage, renderer))
    }

    /// Creates a coordinator over caller-supplied storage and renderer
    pub fn with_parts(
        config: Config,
        storage: StorageHandles,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        let worker = Arc::new(build_worker(&config, &storage, renderer.clone()));

        let launcher: WorkerLauncher = Arc::new(move |lease: WorkerLease| {
            let worker = worker.clone();
            async move {
                worker.run(lease).await;
            }
            .boxed()
        });
        let supervisor = Arc::new(TaskSupervisor::new(
            config.scheduler.max_concurrent_workers as usize,
            launcher,
        ));

        let scheduler = Arc::new(Scheduler::new(
            storage.queue.clone(),
            supervisor.clone(),
            &config.scheduler,
        ));

        let discovery = config.discovery.enabled.then(|| {
            Arc::new(CategoryDiscovery::new(
                storage.queue.clone(),
                renderer,
                &config.discovery,
                &config.crawler,
            ))
        });

        Self {
            config: Arc::new(config),
            storage,
            supervisor,
            scheduler,
            discovery,
        }
    }

    pub fn storage(&self) -> &StorageHandles {
        &self.storage
    }

    pub fn supervisor(&self) -> &Arc<TaskSupervisor> {
        &self.supervisor
    }

    /// Runs the service until `shutdown` fires, then stops every worker
    pub async fn run(self, shutdown: StopSignal) -> crate::Result<()> {
        tracing::info!(
            "Starting crawl service: {} workers max, batch size {}",
            self.config.scheduler.max_concurrent_workers,
            self.config.crawler.page_batch_size
        );

        let scheduler_task = tokio::spawn({
            let scheduler = self.scheduler.clone();
            let shutdown = shutdown.clone();
            async move { scheduler.run(shutdown).await }
        });

        let discovery_task = self.discovery.clone().map(|discovery| {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { discovery.run(shutdown).await })
        });

        let api_task = self.config.api.clone().map(|api_config| {
            let state = AppState::new(self.storage.clone()).with_supervisor(self.supervisor.clone());
            tokio::spawn(async move {
                if let Err(e) = api::serve(state, &api_config.host, api_config.port).await {
                    tracing::error!("API server stopped: {:#}", e);
                }
            })
        });

        shutdown.stopped().await;
        tracing::info!("Shutdown requested, stopping crawl service");

        if let Err(e) = scheduler_task.await {
            tracing::error!("Scheduler task ended abnormally: {}", e);
        }
        if let Some(task) = discovery_task {
            if let Err(e) = task.await {
                tracing::error!("Discovery task ended abnormally: {}", e);
            }
        }
        if let Some(task) = api_task {
            task.abort();
        }

        self.supervisor.shutdown().await;
        tracing::info!("Crawl service stopped");
        Ok(())
    }
}

/// Builds the per-site worker shared by every supervised task
pub fn build_worker(
    config: &Config,
    storage: &StorageHandles,
    renderer: Arc<dyn PageRenderer>,
) -> CrawlWorker {
    let selector = AdaptiveSelector::new(
        storage.strategy.clone(),
        LinkClassifier::new(config.crawler.product_path_markers.clone()),
    );
    let extractor = LinkExtractor::new(
        renderer,
        selector,
        Duration::from_millis(config.crawler.page_timeout_ms),
        Duration::from_millis(config.crawler.inter_page_delay_ms),
    );
    let engine = PaginatedCrawlEngine::from_config(extractor, &config.crawler);

    CrawlWorker::new(
        storage.queue.clone(),
        storage.checkpoints.clone(),
        engine,
        WorkerSettings::from(&config.crawler),
    )
}
