//! HTTP page renderer
//!
//! Fetches pages with reqwest and reads anchors with scraper. Pages are
//! treated as blocked when the server answers with an access-denial status
//! or serves a bot-challenge page.

use crate::config::UserAgentConfig;
use crate::render::parser::parse_page;
use crate::render::{PageRenderer, RenderRequest};
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Statuses that mean the site refused automated access
const BLOCK_STATUSES: [StatusCode; 4] = [
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::SERVICE_UNAVAILABLE,
];

/// Title prefixes served by common bot-challenge pages
const CHALLENGE_TITLES: [&str; 3] = ["Access Denied", "Attention Required", "Just a moment"];

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_crawler::config::UserAgentConfig;
/// use catalog_crawler::render::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "CatalogCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer backed by plain HTTP requests
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a renderer with the configured user agent
    pub fn from_config(config: &UserAgentConfig) -> crate::Result<Self> {
        Ok(Self::new(build_http_client(config)?))
    }
}

fn is_challenge_title(title: &str) -> bool {
    CHALLENGE_TITLES
        .iter()
        .any(|prefix| title.starts_with(prefix))
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render_anchors(&self, request: &RenderRequest) -> crate::Result<Vec<String>> {
        let url = Url::parse(&request.url)?;

        let response = self
            .client
            .get(url.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CrawlError::render(&request.url, "navigation timed out")
                } else {
                    CrawlError::render(&request.url, format!("navigation failed: {}", e))
                }
            })?;

        let status = response.status();
        if BLOCK_STATUSES.contains(&status) {
            return Err(CrawlError::render(
                &request.url,
                format!("automation blocked (HTTP {})", status.as_u16()),
            ));
        }
        if status.is_server_error() {
            return Err(CrawlError::render(
                &request.url,
                format!("server error (HTTP {})", status.as_u16()),
            ));
        }

        // Final URL after redirects is the base for relative anchors
        let base = response.url().clone();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CrawlError::render(&request.url, "navigation timed out")
            } else {
                CrawlError::render(&request.url, format!("body read failed: {}", e))
            }
        })?;

        let page = parse_page(&body, &base);
        if let Some(title) = page.title.as_deref() {
            if is_challenge_title(title) {
                return Err(CrawlError::render(
                    &request.url,
                    format!("automation blocked (challenge page \"{}\")", title),
                ));
            }
        }

        if !request.settle_delay.is_zero() {
            tokio::time::sleep(request.settle_delay).await;
        }

        tracing::trace!(
            "Rendered {} ({}): {} anchors",
            request.url,
            status.as_u16(),
            page.anchors.len()
        );

        Ok(page.anchors)
    }
}
