//! Batched pagination over one category
//!
//! Pages are fetched `batch_size` at a time. Every page in a batch runs
//! concurrently and adds its unseen candidates to the category's shared
//! seen-set. The crawl ends after the first batch in which no page
//! contributed a new link.

use crate::config::CrawlerConfig;
use crate::crawler::signal::StopSignal;
use crate::extraction::{LinkExtractor, LinkSet};
use crate::url::{last_path_segment, page_url};
use crate::CrawlError;
use futures::future::join_all;
use std::sync::{Mutex, PoisonError};

/// Links found for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResult {
    /// Last path segment of the category URL
    pub category: String,
    /// Every unique candidate link, in discovery order
    pub links: Vec<String>,
    pub pages_fetched: u32,
    pub batches: u32,
}

/// Drives batched page fetches for a category until pagination is exhausted
#[derive(Clone)]
pub struct PaginatedCrawlEngine {
    extractor: LinkExtractor,
    batch_size: u32,
    page_param: String,
}

impl PaginatedCrawlEngine {
    pub fn new(extractor: LinkExtractor, batch_size: u32, page_param: impl Into<String>) -> Self {
        Self {
            extractor,
            batch_size: batch_size.max(1),
            page_param: page_param.into(),
        }
    }

    pub fn from_config(extractor: LinkExtractor, config: &CrawlerConfig) -> Self {
        Self::new(extractor, config.page_batch_size, config.page_param.clone())
    }

    /// Crawls every pagination page of `category_url`
    ///
    /// Any page failure fails the whole category. A stop request is honored
    /// between batches, never inside one.
    pub async fn crawl_category(
        &self,
        domain: &str,
        category_url: &str,
        stop: &StopSignal,
    ) -> crate::Result<CategoryResult> {
        let seen = Mutex::new(LinkSet::new());
        let mut page_start: u32 = 1;
        let mut batches = 0;

        loop {
            let page_end = page_start.saturating_add(self.batch_size - 1);
            tracing::debug!("{}: fetching pages {}-{}", category_url, page_start, page_end);

            let fetches = (page_start..=page_end)
                .map(|page| self.fetch_page(domain, category_url, page, &seen));
            let results = join_all(fetches).await;
            batches += 1;

            let mut batch_new = 0;
            for result in results {
                batch_new += result?;
            }

            tracing::debug!(
                "{}: pages {}-{} added {} new links",
                category_url,
                page_start,
                page_end,
                batch_new
            );

            if batch_new == 0 || page_end == u32::MAX {
                break;
            }
            if stop.is_stopped() {
                return Err(CrawlError::Cancelled);
            }
            page_start = page_end + 1;
        }

        let links = seen
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_vec();

        Ok(CategoryResult {
            category: last_path_segment(category_url).unwrap_or_else(|| category_url.to_string()),
            links,
            pages_fetched: batches * self.batch_size,
            batches,
        })
    }

    /// Fetches one page and returns how many links it added to `seen`
    async fn fetch_page(
        &self,
        domain: &str,
        category_url: &str,
        page: u32,
        seen: &Mutex<LinkSet>,
    ) -> crate::Result<usize> {
        let url = page_url(category_url, &self.page_param, page)?;
        let candidates = self.extractor.extract(domain, &url, category_url).await?;

        let mut seen = seen.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(seen.absorb(&candidates).len())
    }
}
