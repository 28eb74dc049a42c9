//! Producer-facing API
//!
//! Two operations sit at the boundary between the crawl core and whoever
//! feeds it sites:
//! - [`add_sites`] turns a list of URLs into empty queue entries
//! - [`fetch_result`] returns the product links collected for a site
//!
//! Both are plain functions over the storage traits. The HTTP surface in
//! [`routes`] wraps them for remote producers.

mod handlers;
mod routes;

pub use handlers::ApiResponse;
pub use routes::create_router;

use crate::crawler::WorkerSupervisor;
use crate::storage::{ResultStore, StorageHandles, TaskQueue};
use crate::url::domain_of;
use crate::CrawlError;
use serde::Serialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

/// Outcome of an add-sites request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddReport {
    /// Domains that got a new queue entry
    pub created: Vec<String>,
    /// Domains that already had one
    pub already_queued: Vec<String>,
}

/// Creates one empty queue entry per unique domain in `urls`
///
/// Fails with [`CrawlError::InvalidInput`] on an empty list and with
/// [`CrawlError::Url`] on the first URL that does not parse. Nothing is
/// enqueued unless every URL parses.
pub fn add_sites(queue: &dyn TaskQueue, urls: &[String]) -> crate::Result<AddReport> {
    if urls.is_empty() {
        return Err(CrawlError::InvalidInput(
            "'urls' must be a non-empty array".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    for url in urls {
        let domain = domain_of(url)?;
        if seen.insert(domain.clone()) {
            domains.push(domain);
        }
    }

    let mut report = AddReport::default();
    for domain in domains {
        if queue.enqueue(&domain, &[])? {
            tracing::info!("Queued {}", domain);
            report.created.push(domain);
        } else {
            tracing::debug!("{} is already queued", domain);
            report.already_queued.push(domain);
        }
    }

    Ok(report)
}

/// Returns the result entry for a domain or URL
///
/// A missing entry fails with [`CrawlError::ResultNotFound`], which lists
/// every domain that currently has results.
pub fn fetch_result(results: &dyn ResultStore, domain_or_url: &str) -> crate::Result<Vec<String>> {
    let input = domain_or_url.trim();
    if input.is_empty() {
        return Err(CrawlError::InvalidInput(
            "'weburl' must be a non-empty string".to_string(),
        ));
    }

    let domain = if input.contains("://") {
        domain_of(input)?
    } else {
        input.trim_end_matches('/').to_ascii_lowercase()
    };

    match results.read_results(&domain) {
        Ok(links) => Ok(links),
        Err(e) if e.is_not_found() => Err(CrawlError::ResultNotFound {
            available: results.result_domains()?,
            domain,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Shared state for the HTTP surface
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageHandles,
    /// Present when the API runs inside the crawl service
    pub supervisor: Option<Arc<dyn WorkerSupervisor>>,
}

impl AppState {
    pub fn new(storage: StorageHandles) -> Self {
        Self {
            storage,
            supervisor: None,
        }
    }

    pub fn with_supervisor(mut self, supervisor: Arc<dyn WorkerSupervisor>) -> Self {
        self.supervisor = Some(supervisor);
        self
    }
}

/// Serves the API until the listener fails
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting API server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
