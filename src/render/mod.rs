//! Page rendering capability
//!
//! The crawl core never talks to the network directly. It asks a
//! [`PageRenderer`] to load a URL and hand back the page's anchor targets.
//! [`HttpRenderer`] is the built-in implementation; tests substitute a
//! scripted renderer.

mod http;
mod parser;

pub use http::{build_http_client, HttpRenderer};
pub use parser::{parse_page, ParsedPage};

use async_trait::async_trait;
use std::time::Duration;

/// One page load
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    /// Bound on navigation before the load counts as failed
    pub timeout: Duration,
    /// Wait after the page loads, before anchors are read
    pub settle_delay: Duration,
}

impl RenderRequest {
    pub fn new(url: impl Into<String>, timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            settle_delay,
        }
    }
}

/// Loads a page and returns its absolute anchor targets
///
/// Fails with [`crate::CrawlError::RenderFailure`] on navigation timeout or
/// when the site blocks automated access.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render_anchors(&self, request: &RenderRequest) -> crate::Result<Vec<String>>;
}
