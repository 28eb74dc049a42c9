//! Configuration module for Catalog-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Worker cap: {}", config.scheduler.max_concurrent_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, CrawlerConfig, DiscoveryConfig, SchedulerConfig, StorageBackend,
    StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash, parse_config};
