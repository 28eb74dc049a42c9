//! Category discovery for newly queued sites
//!
//! Producers enqueue a site with an empty payload. Discovery renders the
//! site's homepage, keeps the on-domain anchors that survive the ignore
//! list, and writes them into the job as its category list.

use crate::config::{CrawlerConfig, DiscoveryConfig};
use crate::crawler::signal::StopSignal;
use crate::render::{PageRenderer, RenderRequest};
use crate::storage::TaskQueue;
use crate::url::{category_candidates, homepage_url};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Counts for one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub populated: usize,
    pub empty: usize,
    pub failed: usize,
}

pub struct CategoryDiscovery {
    queue: Arc<dyn TaskQueue>,
    renderer: Arc<dyn PageRenderer>,
    words_to_ignore: Vec<String>,
    page_timeout: Duration,
    poll_interval: Duration,
}

impl CategoryDiscovery {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        renderer: Arc<dyn PageRenderer>,
        discovery: &DiscoveryConfig,
        crawler: &CrawlerConfig,
    ) -> Self {
        Self {
            queue,
            renderer,
            words_to_ignore: discovery.words_to_ignore.clone(),
            page_timeout: Duration::from_millis(crawler.page_timeout_ms),
            poll_interval: Duration::from_millis(discovery.poll_interval_ms),
        }
    }

    /// Renders the homepage of `domain` and returns its category candidates
    pub async fn discover(&self, domain: &str) -> crate::Result<Vec<String>> {
        let homepage = homepage_url(domain);
        let request = RenderRequest::new(homepage.as_str(), self.page_timeout, Duration::ZERO);
        let anchors = self.renderer.render_anchors(&request).await?;

        Ok(category_candidates(
            &anchors,
            domain,
            &homepage,
            &self.words_to_ignore,
        ))
    }

    /// Fills every pending job that is still awaiting discovery
    pub async fn tick(&self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        let pending = match self.queue.list_pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!("Discovery could not list pending jobs: {}", e);
                report.failed += 1;
                return report;
            }
        };

        for domain in pending {
            match self.queue.read_job(&domain) {
                Ok(job) if job.is_awaiting_discovery() => {}
                Ok(_) => continue,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    tracing::warn!("Discovery could not read job for {}: {}", domain, e);
                    report.failed += 1;
                    continue;
                }
            }

            let categories = match self.discover(&domain).await {
                Ok(categories) => categories,
                Err(e) => {
                    tracing::warn!("Category discovery failed for {}: {}", domain, e);
                    report.failed += 1;
                    continue;
                }
            };

            if categories.is_empty() {
                tracing::warn!("No categories found on {}, leaving job for retry", domain);
                report.empty += 1;
                continue;
            }

            match self.queue.populate(&domain, &categories) {
                Ok(true) => {
                    tracing::info!("Discovered {} categories for {}", categories.len(), domain);
                    report.populated += 1;
                }
                Ok(false) => tracing::debug!("Job for {} changed during discovery", domain),
                Err(e) => {
                    tracing::error!("Failed to store categories for {}: {}", domain, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Runs discovery passes at the configured interval until `shutdown` fires
    pub async fn run(&self, shutdown: StopSignal) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!("Category discovery started (poll every {:?})", self.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.stopped() => break,
            }

            tokio::select! {
                report = self.tick() => {
                    if report != DiscoveryReport::default() {
                        tracing::debug!("Discovery pass: {:?}", report);
                    }
                }
                _ = shutdown.stopped() => break,
            }
        }

        tracing::info!("Category discovery stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;
    use crate::testing::ScriptedRenderer;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<FsStorage>, Arc<ScriptedRenderer>, CategoryDiscovery) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FsStorage::open(dir.path()).unwrap());
        let renderer = Arc::new(ScriptedRenderer::new());
        let discovery = CategoryDiscovery {
            queue: storage.clone(),
            renderer: renderer.clone(),
            words_to_ignore: vec!["faqs".to_string(), "returns".to_string()],
            page_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
        };
        (dir, storage, renderer, discovery)
    }

    #[tokio::test]
    async fn test_discover_filters_homepage_anchors() {
        let (_dir, _storage, renderer, discovery) = setup();
        renderer.page(
            "https://shop.com/",
            &[
                "https://shop.com/",
                "https://shop.com/shoes",
                "https://shop.com/faqs",
                "https://other.org/shoes",
                "https://shop.com/bags",
                "https://shop.com/shoes",
            ],
        );

        let categories = discovery.discover("shop.com").await.unwrap();

        assert_eq!(
            categories,
            vec!["https://shop.com/shoes".to_string(), "https://shop.com/bags".to_string()]
        );
    }

    #[tokio::test]
    async fn test_tick_populates_only_awaiting_jobs() {
        let (_dir, storage, renderer, discovery) = setup();
        renderer.page("https://new.com/", &["https://new.com/hats"]);
        storage.enqueue("new.com", &[]).unwrap();
        storage
            .enqueue("ready.com", &["https://ready.com/shoes".to_string()])
            .unwrap();

        let report = discovery.tick().await;

        assert_eq!(report.populated, 1);
        assert_eq!(
            storage.read_job("new.com").unwrap().categories,
            vec!["https://new.com/hats".to_string()]
        );
        // Only the awaiting site's homepage is rendered
        assert_eq!(renderer.calls(), vec!["https://new.com/".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_on_one_site_does_not_stop_pass() {
        let (_dir, storage, renderer, discovery) = setup();
        renderer.fail("https://a.com/");
        renderer.page("https://b.com/", &["https://b.com/shoes"]);
        storage.enqueue("a.com", &[]).unwrap();
        storage.enqueue("b.com", &[]).unwrap();

        let report = discovery.tick().await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.populated, 1);
        assert!(storage.read_job("a.com").unwrap().is_awaiting_discovery());
        assert!(!storage.read_job("b.com").unwrap().is_awaiting_discovery());
    }

    #[tokio::test]
    async fn test_empty_homepage_leaves_job_awaiting() {
        let (_dir, storage, _renderer, discovery) = setup();
        storage.enqueue("bare.com", &[]).unwrap();

        let report = discovery.tick().await;

        assert_eq!(report.empty, 1);
        assert!(storage.read_job("bare.com").unwrap().is_awaiting_discovery());
    }
}
