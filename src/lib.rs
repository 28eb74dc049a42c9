//! Catalog-Crawler: a durable product-link harvester
//!
//! This crate discovers product links on e-commerce sites by crawling paginated
//! category pages. Pending sites live in a durable task queue, a scheduler
//! dispatches at most one worker per site under a global concurrency cap, and each
//! worker runs a resumable, checkpointed crawl that adapts its link-extraction
//! strategy to the site.

pub mod api;
pub mod config;
pub mod crawler;
pub mod extraction;
pub mod output;
pub mod render;
pub mod storage;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

/// Main error type for Catalog-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render failure for {url}: {reason}")]
    RenderFailure { url: String, reason: String },

    #[error("Not Found: no results for {domain}, available: [{}]", available.join(", "))]
    ResultNotFound {
        domain: String,
        available: Vec<String>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled by shutdown")]
    Cancelled,
}

impl CrawlError {
    /// Returns true if the error means "absent, try again later"
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ResultNotFound { .. } => true,
            Self::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if the error came from the render capability
    pub fn is_render_failure(&self) -> bool {
        matches!(self, Self::RenderFailure { .. })
    }

    /// Builds a render failure for the given URL
    pub fn render(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RenderFailure {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Catalog-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlWorker, PaginatedCrawlEngine, Scheduler};
pub use extraction::{ExtractionStrategy, LinkExtractor};
pub use crate::url::{domain_of, extract_domain};
