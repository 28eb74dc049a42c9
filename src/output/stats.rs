//! Pipeline statistics from durable crawl state
//!
//! This module provides functionality for summarizing the queue,
//! checkpoint and result stores and displaying the summary.

use crate::storage::StorageHandles;
use crate::CrawlError;
use serde::Serialize;

/// Progress of one site with a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteProgress {
    pub domain: String,
    pub processed_categories: usize,
    pub total_categories: usize,
    pub links: usize,
}

/// Pipeline statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStatistics {
    /// Jobs currently in the queue
    pub pending_jobs: u64,

    /// Queued jobs whose category list is still empty
    pub awaiting_discovery: u64,

    /// Queued jobs with at least one committed category
    pub in_progress: Vec<SiteProgress>,

    /// Sites with a result entry
    pub completed_results: u64,

    /// Product links across every result entry
    pub total_links: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - Handles to every store
///
/// # Returns
///
/// * `Ok(PipelineStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - A store could not be read
pub fn load_statistics(storage: &StorageHandles) -> Result<PipelineStatistics, CrawlError> {
    let mut stats = PipelineStatistics::default();

    for domain in storage.queue.list_pending()? {
        let job = match storage.queue.read_job(&domain) {
            Ok(job) => job,
            // Finished between listing and reading
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        };
        stats.pending_jobs += 1;

        if job.is_awaiting_discovery() {
            stats.awaiting_discovery += 1;
            continue;
        }

        if let Some(checkpoint) = storage.checkpoints.load(&domain)? {
            stats.in_progress.push(SiteProgress {
                domain,
                processed_categories: checkpoint.processed_categories,
                total_categories: job.categories.len(),
                links: checkpoint.links.len(),
            });
        }
    }

    for domain in storage.results.result_domains()? {
        match storage.results.read_results(&domain) {
            Ok(links) => {
                stats.completed_results += 1;
                stats.total_links += links.len() as u64;
            }
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &PipelineStatistics) {
    println!("=== Pipeline Statistics ===\n");

    println!("Queue:");
    println!("  Pending jobs: {}", stats.pending_jobs);
    println!("  Awaiting discovery: {}", stats.awaiting_discovery);
    println!("  In progress: {}", stats.in_progress.len());
    println!();

    if !stats.in_progress.is_empty() {
        println!("Checkpoints:");
        for site in &stats.in_progress {
            println!(
                "  {}: {}/{} categories, {} links",
                site.domain, site.processed_categories, site.total_categories, site.links
            );
        }
        println!();
    }

    println!("Results:");
    println!("  Sites with results: {}", stats.completed_results);
    println!("  Total product links: {}", stats.total_links);
}
