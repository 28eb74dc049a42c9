//! Output module for operator-facing reports
//!
//! This module handles summarizing durable crawl state for the `--stats`
//! command and the API status endpoint.

pub mod stats;

pub use stats::{load_statistics, print_statistics, PipelineStatistics, SiteProgress};
