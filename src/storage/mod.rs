//! Storage module for durable crawl state
//!
//! This module holds everything that must survive a restart:
//! - the task queue of pending sites
//! - per-site checkpoints and result entries
//! - the per-site extraction strategy decision
//!
//! Two backends implement the same traits: [`FsStorage`] keeps one JSON
//! file per domain in separate directories, [`SqliteStorage`] keeps the same
//! records in an embedded database.

mod fs;
mod schema;
mod sqlite;
mod traits;

pub use fs::FsStorage;
pub use sqlite::SqliteStorage;
pub use traits::{
    validate_key, CheckpointStore, ResultStore, StorageError, StorageResult, StrategyCache,
    TaskQueue,
};

use crate::config::{StorageBackend, StorageConfig};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A pending site job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub domain: String,
    /// Category URLs in crawl order; empty until discovery fills it
    pub categories: Vec<String>,
}

impl CrawlJob {
    /// An empty payload means discovery has not run yet, not that the job is done
    pub fn is_awaiting_discovery(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Persisted per-site crawl progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Number of fully completed categories
    pub processed_categories: usize,
    /// Product links accumulated across completed categories
    pub links: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(processed_categories: usize, links: Vec<String>) -> Self {
        Self {
            processed_categories,
            links,
            updated_at: Utc::now(),
        }
    }
}

/// Shared handles to every store, independent of backend
#[derive(Clone)]
pub struct StorageHandles {
    pub queue: Arc<dyn TaskQueue>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub strategy: Arc<dyn StrategyCache>,
    pub results: Arc<dyn ResultStore>,
}

impl StorageHandles {
    /// Wraps one backend that implements all four stores
    pub fn from_backend<S>(backend: S) -> Self
    where
        S: TaskQueue + CheckpointStore + StrategyCache + ResultStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            queue: backend.clone(),
            checkpoints: backend.clone(),
            strategy: backend.clone(),
            results: backend,
        }
    }
}

/// Opens the configured storage backend
pub fn open_storage(config: &StorageConfig) -> Result<StorageHandles, CrawlError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let storage = FsStorage::open(Path::new(&config.data_dir))?;
            Ok(StorageHandles::from_backend(storage))
        }
        StorageBackend::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                CrawlError::InvalidInput("database_path is required for sqlite".to_string())
            })?;
            let storage = SqliteStorage::new(Path::new(path))?;
            Ok(StorageHandles::from_backend(storage))
        }
    }
}
