//! Storage traits and error types
//!
//! This module defines the trait interfaces for the durable stores and
//! associated error types. Every store is keyed by site domain.

use crate::storage::{Checkpoint, CrawlJob};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Invalid domain key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Absent entries are "not ready yet", never a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable queue of pending site jobs
///
/// An entry's existence means the site is pending or in progress. Entries
/// are created by producers, filled by category discovery, and removed by
/// the owning worker when the crawl completes.
pub trait TaskQueue: Send + Sync {
    /// Creates a job for `domain` unless one already exists
    ///
    /// Returns `true` if a new entry was created. Never overwrites.
    fn enqueue(&self, domain: &str, categories: &[String]) -> StorageResult<bool>;

    /// Snapshot of current job identities; may be stale by the time it is used
    fn list_pending(&self) -> StorageResult<Vec<String>>;

    /// Reads a job, failing with [`StorageError::NotFound`] if absent
    fn read_job(&self, domain: &str) -> StorageResult<CrawlJob>;

    /// Fills the category list of an existing, still-empty job
    ///
    /// Returns `true` if the payload was written. Absent jobs and jobs that
    /// already carry categories are left alone.
    fn populate(&self, domain: &str, categories: &[String]) -> StorageResult<bool>;

    /// Deletes a job; removing an absent job is not an error
    fn remove(&self, domain: &str) -> StorageResult<()>;
}

/// Per-site crawl progress, single writer per domain
pub trait CheckpointStore: Send + Sync {
    fn load(&self, domain: &str) -> StorageResult<Option<Checkpoint>>;

    /// Persists a checkpoint and rewrites the site's result entry
    ///
    /// Returns only after the write is confirmed on the backing store.
    fn commit(&self, domain: &str, checkpoint: &Checkpoint) -> StorageResult<()>;

    /// Drops the checkpoint after a completed crawl; idempotent
    fn discard(&self, domain: &str) -> StorageResult<()>;
}

/// Write-once per-site record of whether the primary extraction strategy works
pub trait StrategyCache: Send + Sync {
    fn get(&self, domain: &str) -> StorageResult<Option<bool>>;

    /// Stores `primary_effective` unless a decision exists, then returns the
    /// decision that is actually stored
    fn get_or_insert(&self, domain: &str, primary_effective: bool) -> StorageResult<bool>;
}

/// Read side of the per-site product link results
pub trait ResultStore: Send + Sync {
    /// Reads a site's links, failing with [`StorageError::NotFound`] if absent
    fn read_results(&self, domain: &str) -> StorageResult<Vec<String>>;

    /// Domains that currently have a result entry
    fn result_domains(&self) -> StorageResult<Vec<String>>;
}

/// Rejects keys that cannot safely name a store entry
pub fn validate_key(domain: &str) -> StorageResult<()> {
    let invalid = domain.is_empty()
        || domain.starts_with('.')
        || domain.contains("..")
        || domain.contains('/')
        || domain.contains('\\')
        || domain.chars().any(|c| c.is_control() || c.is_whitespace());

    if invalid {
        return Err(StorageError::InvalidKey(domain.to_string()));
    }
    Ok(())
}
