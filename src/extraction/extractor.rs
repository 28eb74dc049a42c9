use crate::extraction::adaptive::AdaptiveSelector;
use crate::render::{PageRenderer, RenderRequest};
use std::sync::Arc;
use std::time::Duration;

/// Produces product-candidate links for one rendered page
///
/// Holds no per-crawl state: the caller owns deduplication across pages.
#[derive(Clone)]
pub struct LinkExtractor {
    renderer: Arc<dyn PageRenderer>,
    selector: AdaptiveSelector,
    page_timeout: Duration,
    settle_delay: Duration,
}

impl LinkExtractor {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        selector: AdaptiveSelector,
        page_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            renderer,
            selector,
            page_timeout,
            settle_delay,
        }
    }

    /// Renders `page_url` and classifies its anchors against `category_url`
    pub async fn extract(
        &self,
        domain: &str,
        page_url: &str,
        category_url: &str,
    ) -> crate::Result<Vec<String>> {
        let request = RenderRequest::new(page_url, self.page_timeout, self.settle_delay);
        let anchors = self.renderer.render_anchors(&request).await?;
        let selection = self.selector.select(domain, &anchors, category_url)?;

        tracing::debug!(
            "{}: {} anchors, {} candidates ({})",
            page_url,
            anchors.len(),
            selection.links.len(),
            selection.strategy.as_str()
        );

        Ok(selection.links)
    }
}
