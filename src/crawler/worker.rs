//! Per-site resumable crawl
//!
//! A worker owns one domain for its whole run. It waits for the job's
//! category list, resumes from the last committed checkpoint, and commits
//! after every completed category. Completion removes the job; any failure
//! leaves the job and checkpoint in place for a later resume.

use crate::config::CrawlerConfig;
use crate::crawler::engine::PaginatedCrawlEngine;
use crate::crawler::signal::StopSignal;
use crate::crawler::supervisor::WorkerLease;
use crate::extraction::filter_unique_links;
use crate::storage::{Checkpoint, CheckpointStore, CrawlJob, TaskQueue};
use crate::CrawlError;
use std::sync::Arc;
use std::time::Duration;

/// How a worker run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// All categories done; job removed
    Completed { categories: usize, links: usize },
    /// Unrecoverable error; job and checkpoint kept
    Failed(String),
    /// The job never became ready within the wait budget
    Abandoned,
    /// Stopped on request before finishing
    Cancelled,
}

/// Timing and bounds for a worker
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub job_retry_interval: Duration,
    pub job_wait_attempts: u32,
    pub max_categories: Option<usize>,
}

impl From<&CrawlerConfig> for WorkerSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            job_retry_interval: Duration::from_millis(config.job_retry_interval_ms),
            job_wait_attempts: config.job_wait_attempts,
            max_categories: config.max_categories_per_job.map(|n| n as usize),
        }
    }
}

/// Runs the resumable crawl for one site
pub struct CrawlWorker {
    queue: Arc<dyn TaskQueue>,
    checkpoints: Arc<dyn CheckpointStore>,
    engine: PaginatedCrawlEngine,
    settings: WorkerSettings,
}

impl CrawlWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        checkpoints: Arc<dyn CheckpointStore>,
        engine: PaginatedCrawlEngine,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            checkpoints,
            engine,
            settings,
        }
    }

    /// Runs the lease's domain to an outcome, then gives the slot back
    pub async fn run(&self, lease: WorkerLease) -> WorkerOutcome {
        let domain = lease.domain().to_string();
        let outcome = self.run_job(&domain, lease.stop_signal()).await;

        match &outcome {
            WorkerOutcome::Completed { categories, links } => tracing::info!(
                "{}: completed {} categories, {} product links",
                domain,
                categories,
                links
            ),
            WorkerOutcome::Failed(reason) => {
                tracing::error!("{}: crawl failed, will resume later: {}", domain, reason)
            }
            WorkerOutcome::Abandoned => {
                tracing::warn!("{}: job not ready, releasing worker slot", domain)
            }
            WorkerOutcome::Cancelled => tracing::info!("{}: stopped on request", domain),
        }

        lease.release();
        outcome
    }

    /// Runs the crawl for `domain` without supervisor bookkeeping
    pub async fn run_job(&self, domain: &str, stop: &StopSignal) -> WorkerOutcome {
        let job = match self.wait_for_job(domain, stop).await {
            Ok(Some(job)) => job,
            Ok(None) => return WorkerOutcome::Abandoned,
            Err(CrawlError::Cancelled) => return WorkerOutcome::Cancelled,
            Err(e) => return WorkerOutcome::Failed(e.to_string()),
        };

        match self.crawl(&job, stop).await {
            Ok((categories, links)) => {
                self.finalize(domain);
                WorkerOutcome::Completed { categories, links }
            }
            Err(CrawlError::Cancelled) => WorkerOutcome::Cancelled,
            Err(e) => WorkerOutcome::Failed(e.to_string()),
        }
    }

    /// Reads the job, waiting while it is missing or still unpopulated
    async fn wait_for_job(&self, domain: &str, stop: &StopSignal) -> crate::Result<Option<CrawlJob>> {
        let attempts = self.settings.job_wait_attempts.max(1);

        for attempt in 1..=attempts {
            match self.queue.read_job(domain) {
                Ok(job) if !job.is_awaiting_discovery() => return Ok(Some(job)),
                Ok(_) => tracing::debug!("{}: awaiting category discovery", domain),
                Err(e) if e.is_not_found() => tracing::debug!("{}: job not present yet", domain),
                Err(e) => return Err(e.into()),
            }

            if attempt < attempts && stop.sleep(self.settings.job_retry_interval).await {
                return Err(CrawlError::Cancelled);
            }
        }

        Ok(None)
    }

    /// Crawls the remaining categories; returns (categories done, total links)
    async fn crawl(&self, job: &CrawlJob, stop: &StopSignal) -> crate::Result<(usize, usize)> {
        let domain = job.domain.as_str();
        let (mut processed, mut links) = match self.checkpoints.load(domain)? {
            Some(checkpoint) => (checkpoint.processed_categories, checkpoint.links),
            None => (0, Vec::new()),
        };

        let bound = self
            .settings
            .max_categories
            .map_or(job.categories.len(), |max| max.min(job.categories.len()));

        if processed >= bound && processed > 0 {
            tracing::info!("{}: every category already checkpointed, finishing", domain);
        } else if processed > 0 {
            tracing::info!(
                "{}: resuming at category {} of {} ({} links so far)",
                domain,
                processed + 1,
                bound,
                links.len()
            );
        }

        for (index, category_url) in job.categories.iter().enumerate().take(bound).skip(processed) {
            if stop.is_stopped() {
                return Err(CrawlError::Cancelled);
            }

            tracing::info!("{}: category {}/{} {}", domain, index + 1, bound, category_url);
            let result = self.engine.crawl_category(domain, category_url, stop).await?;

            let merged = filter_unique_links(&result.links, &links);
            links = merged.updated_links;
            processed = index + 1;

            self.checkpoints
                .commit(domain, &Checkpoint::new(processed, links.clone()))?;

            tracing::info!(
                "{}: category '{}' done ({} pages, {} new links, {} total)",
                domain,
                result.category,
                result.pages_fetched,
                merged.new_links.len(),
                links.len()
            );
        }

        Ok((processed.min(bound), links.len()))
    }

    /// Removes the job, then drops the checkpoint
    ///
    /// The checkpoint goes only once the job is gone. A job that survives a
    /// failed removal keeps its fully processed checkpoint, so its next run
    /// completes without fetching anything.
    fn finalize(&self, domain: &str) {
        if let Err(e) = self.queue.remove(domain) {
            tracing::warn!("{}: failed to remove job, keeping checkpoint: {}", domain, e);
            return;
        }
        if let Err(e) = self.checkpoints.discard(domain) {
            tracing::warn!("{}: failed to discard checkpoint: {}", domain, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{AdaptiveSelector, LinkClassifier, LinkExtractor};
    use crate::storage::{FsStorage, ResultStore, StorageError, StorageResult};
    use crate::testing::{MemoryStrategyCache, ScriptedRenderer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        storage: Arc<FsStorage>,
        renderer: Arc<ScriptedRenderer>,
        worker: CrawlWorker,
    }

    fn fixture(max_categories: Option<usize>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FsStorage::open(dir.path()).unwrap());
        let renderer = Arc::new(ScriptedRenderer::new());
        let worker = build(storage.clone(), storage.clone(), renderer.clone(), max_categories);

        Fixture {
            _dir: dir,
            storage,
            renderer,
            worker,
        }
    }

    fn build(
        queue: Arc<dyn TaskQueue>,
        checkpoints: Arc<dyn CheckpointStore>,
        renderer: Arc<ScriptedRenderer>,
        max_categories: Option<usize>,
    ) -> CrawlWorker {
        let selector = AdaptiveSelector::new(
            Arc::new(MemoryStrategyCache::default()),
            LinkClassifier::new(vec!["/products/".to_string()]),
        );
        let extractor =
            LinkExtractor::new(renderer, selector, Duration::from_secs(5), Duration::ZERO);
        let engine = PaginatedCrawlEngine::new(extractor, 2, "page");
        let settings = WorkerSettings {
            job_retry_interval: Duration::from_millis(1),
            job_wait_attempts: 3,
            max_categories,
        };
        CrawlWorker::new(queue, checkpoints, engine, settings)
    }

    fn io_error(what: &str) -> StorageError {
        StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, what.to_string()))
    }

    /// Queue whose first `remove` fails
    struct RemoveFailsOnce {
        inner: Arc<FsStorage>,
        removes: AtomicUsize,
    }

    impl TaskQueue for RemoveFailsOnce {
        fn enqueue(&self, domain: &str, categories: &[String]) -> StorageResult<bool> {
            self.inner.enqueue(domain, categories)
        }

        fn list_pending(&self) -> StorageResult<Vec<String>> {
            self.inner.list_pending()
        }

        fn read_job(&self, domain: &str) -> StorageResult<CrawlJob> {
            self.inner.read_job(domain)
        }

        fn populate(&self, domain: &str, categories: &[String]) -> StorageResult<bool> {
            self.inner.populate(domain, categories)
        }

        fn remove(&self, domain: &str) -> StorageResult<()> {
            if self.removes.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(io_error("disk unavailable"));
            }
            self.inner.remove(domain)
        }
    }

    /// Checkpoint store whose `commit` fails on the given call (1-based)
    struct CommitFailsOn {
        inner: Arc<FsStorage>,
        fail_on: usize,
        commits: AtomicUsize,
    }

    impl CheckpointStore for CommitFailsOn {
        fn load(&self, domain: &str) -> StorageResult<Option<Checkpoint>> {
            self.inner.load(domain)
        }

        fn commit(&self, domain: &str, checkpoint: &Checkpoint) -> StorageResult<()> {
            if self.commits.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(io_error("disk full"));
            }
            self.inner.commit(domain, checkpoint)
        }

        fn discard(&self, domain: &str) -> StorageResult<()> {
            self.inner.discard(domain)
        }
    }

    fn category(n: usize) -> String {
        format!("https://shop.com/c{}", n)
    }

    /// One product on page 1 of each category
    fn script_categories(renderer: &ScriptedRenderer, count: usize) {
        for n in 0..count {
            let link = format!("https://shop.com/products/c{}-item", n);
            renderer.page(&format!("{}?page=1", category(n)), &[link.as_str()]);
        }
    }

    #[tokio::test]
    async fn test_completes_and_removes_job() {
        let f = fixture(None);
        script_categories(&f.renderer, 2);
        f.storage.enqueue("shop.com", &[category(0), category(1)]).unwrap();

        let outcome = f.worker.run_job("shop.com", &StopSignal::never()).await;

        assert_eq!(outcome, WorkerOutcome::Completed { categories: 2, links: 2 });
        assert!(f.storage.read_job("shop.com").unwrap_err().is_not_found());
        assert!(f.storage.load("shop.com").unwrap().is_none());
        assert_eq!(f.storage.read_results("shop.com").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_skips_completed_categories() {
        let f = fixture(None);
        script_categories(&f.renderer, 3);
        f.storage
            .enqueue("shop.com", &[category(0), category(1), category(2)])
            .unwrap();
        let earlier = vec!["https://shop.com/products/from-before".to_string()];
        f.storage
            .commit("shop.com", &Checkpoint::new(1, earlier.clone()))
            .unwrap();

        let outcome = f.worker.run_job("shop.com", &StopSignal::never()).await;

        assert_eq!(outcome, WorkerOutcome::Completed { categories: 3, links: 3 });
        assert!(f.renderer.calls().iter().all(|url| !url.starts_with(&category(0))));

        let results = f.storage.read_results("shop.com").unwrap();
        assert_eq!(results[0], earlier[0]);
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_preserves_job_and_checkpoint() {
        let f = fixture(None);
        script_categories(&f.renderer, 2);
        f.renderer.fail(&format!("{}?page=1", category(1)));
        f.storage.enqueue("shop.com", &[category(0), category(1)]).unwrap();

        let outcome = f.worker.run_job("shop.com", &StopSignal::never()).await;

        assert!(matches!(outcome, WorkerOutcome::Failed(_)));
        assert_eq!(f.storage.read_job("shop.com").unwrap().categories.len(), 2);
        let checkpoint = f.storage.load("shop.com").unwrap().unwrap();
        assert_eq!(checkpoint.processed_categories, 1);
        assert_eq!(checkpoint.links.len(), 1);
    }

    #[tokio::test]
    async fn test_category_bound_respected() {
        let f = fixture(Some(1));
        script_categories(&f.renderer, 3);
        f.storage
            .enqueue("shop.com", &[category(0), category(1), category(2)])
            .unwrap();

        let outcome = f.worker.run_job("shop.com", &StopSignal::never()).await;

        assert_eq!(outcome, WorkerOutcome::Completed { categories: 1, links: 1 });
        assert!(f.renderer.calls().iter().all(|url| url.starts_with(&category(0))));
    }

    #[tokio::test]
    async fn test_abandons_unpopulated_job() {
        let f = fixture(None);
        f.storage.enqueue("shop.com", &[]).unwrap();

        let outcome = f.worker.run_job("shop.com", &StopSignal::never()).await;

        assert_eq!(outcome, WorkerOutcome::Abandoned);
        assert!(f.storage.read_job("shop.com").is_ok());
        assert_eq!(f.renderer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_abandons_missing_job() {
        let f = fixture(None);
        let outcome = f.worker.run_job("ghost.com", &StopSignal::never()).await;
        assert_eq!(outcome, WorkerOutcome::Abandoned);
    }

    #[tokio::test]
    async fn test_stop_before_start_cancels() {
        let f = fixture(None);
        script_categories(&f.renderer, 1);
        f.storage.enqueue("shop.com", &[category(0)]).unwrap();
        let (handle, signal) = crate::crawler::signal::stop_channel();
        handle.stop();

        let outcome = f.worker.run_job("shop.com", &signal).await;

        assert_eq!(outcome, WorkerOutcome::Cancelled);
        assert!(f.storage.read_job("shop.com").is_ok());
        assert_eq!(f.renderer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_job_removal_keeps_finished_checkpoint() {
        let f = fixture(None);
        script_categories(&f.renderer, 3);
        f.storage
            .enqueue("shop.com", &[category(0), category(1), category(2)])
            .unwrap();
        let queue = Arc::new(RemoveFailsOnce {
            inner: f.storage.clone(),
            removes: AtomicUsize::new(0),
        });
        let worker = build(queue, f.storage.clone(), f.renderer.clone(), None);

        let first = worker.run_job("shop.com", &StopSignal::never()).await;

        assert_eq!(first, WorkerOutcome::Completed { categories: 3, links: 3 });
        assert!(f.storage.read_job("shop.com").is_ok());
        let checkpoint = f.storage.load("shop.com").unwrap().unwrap();
        assert_eq!(checkpoint.processed_categories, 3);

        let calls_before = f.renderer.call_count();
        let second = worker.run_job("shop.com", &StopSignal::never()).await;

        assert_eq!(second, WorkerOutcome::Completed { categories: 3, links: 3 });
        assert_eq!(f.renderer.call_count(), calls_before);
        assert!(f.storage.read_job("shop.com").unwrap_err().is_not_found());
        assert!(f.storage.load("shop.com").unwrap().is_none());
        assert_eq!(f.storage.read_results("shop.com").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_checkpoint_write_failure_stops_worker() {
        let f = fixture(None);
        script_categories(&f.renderer, 3);
        f.storage
            .enqueue("shop.com", &[category(0), category(1), category(2)])
            .unwrap();
        let checkpoints = Arc::new(CommitFailsOn {
            inner: f.storage.clone(),
            fail_on: 2,
            commits: AtomicUsize::new(0),
        });
        let worker = build(f.storage.clone(), checkpoints, f.renderer.clone(), None);

        let outcome = worker.run_job("shop.com", &StopSignal::never()).await;

        assert!(matches!(outcome, WorkerOutcome::Failed(_)));
        assert!(f.renderer.calls().iter().all(|url| !url.starts_with(&category(2))));
        assert_eq!(f.storage.read_job("shop.com").unwrap().categories.len(), 3);
        let checkpoint = f.storage.load("shop.com").unwrap().unwrap();
        assert_eq!(checkpoint.processed_categories, 1);
        assert_eq!(checkpoint.links.len(), 1);
    }
}
