//! Filesystem storage backend
//!
//! Layout under the data directory, one JSON file per domain:
//!
//! ```text
//! queue/<domain>.json           JSON array of category URLs (empty file = [])
//! results/<domain>.json         JSON array of product links
//! checkpoints/<domain>.json     {"processed_categories", "links", "updated_at"}
//! strategy-cache/<domain>.json  {"value": bool}
//! ```
//!
//! Rewrites go through a temp file in the same directory followed by
//! `sync_all` and a rename. Create-only writes publish the temp file with a
//! hard link, which fails instead of replacing an existing entry.

use crate::storage::traits::{
    validate_key, CheckpointStore, ResultStore, StorageError, StorageResult, StrategyCache,
    TaskQueue,
};
use crate::storage::{Checkpoint, CrawlJob};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const QUEUE_DIR: &str = "queue";
const RESULTS_DIR: &str = "results";
const CHECKPOINTS_DIR: &str = "checkpoints";
const STRATEGY_DIR: &str = "strategy-cache";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StrategyEntry {
    value: bool,
}

/// JSON-file-per-domain storage
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Opens (and creates if needed) the directory layout under `root`
    pub fn open(root: &Path) -> StorageResult<Self> {
        for dir in [QUEUE_DIR, RESULTS_DIR, CHECKPOINTS_DIR, STRATEGY_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        tracing::debug!("Opened filesystem storage at {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn entry_path(&self, dir: &str, domain: &str) -> StorageResult<PathBuf> {
        validate_key(domain)?;
        Ok(self.root.join(dir).join(format!("{}.json", domain)))
    }

    fn list_dir(&self, dir: &str) -> StorageResult<Vec<String>> {
        let mut domains = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    domains.push(stem.to_string());
                }
            }
        }
        domains.sort();
        Ok(domains)
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}

fn write_temp(target: &Path, bytes: &[u8]) -> StorageResult<PathBuf> {
    let tmp = temp_path(target);
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(tmp)
}

/// Replaces `target` with `bytes` so readers see either the old or new content
fn write_atomic(target: &Path, bytes: &[u8]) -> StorageResult<()> {
    let tmp = write_temp(target, bytes)?;
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Publishes `bytes` at `target` only if nothing is there yet
fn write_new(target: &Path, bytes: &[u8]) -> StorageResult<bool> {
    let tmp = write_temp(target, bytes)?;
    let linked = fs::hard_link(&tmp, target);
    let _ = fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn read_optional(path: &Path) -> StorageResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_present(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Queue entries may be zero-byte files written by producers
fn parse_link_array(content: &str) -> StorageResult<Vec<String>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(content)?)
}

impl TaskQueue for FsStorage {
    fn enqueue(&self, domain: &str, categories: &[String]) -> StorageResult<bool> {
        let path = self.entry_path(QUEUE_DIR, domain)?;
        let body = serde_json::to_vec_pretty(categories)?;
        let created = write_new(&path, &body)?;
        if created {
            tracing::debug!("Enqueued {}", domain);
        }
        Ok(created)
    }

    fn list_pending(&self) -> StorageResult<Vec<String>> {
        self.list_dir(QUEUE_DIR)
    }

    fn read_job(&self, domain: &str) -> StorageResult<CrawlJob> {
        let path = self.entry_path(QUEUE_DIR, domain)?;
        let content =
            read_optional(&path)?.ok_or_else(|| StorageError::NotFound(domain.to_string()))?;
        Ok(CrawlJob {
            domain: domain.to_string(),
            categories: parse_link_array(&content)?,
        })
    }

    fn populate(&self, domain: &str, categories: &[String]) -> StorageResult<bool> {
        let job = match self.read_job(domain) {
            Ok(job) => job,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        if !job.is_awaiting_discovery() {
            return Ok(false);
        }

        let path = self.entry_path(QUEUE_DIR, domain)?;
        write_atomic(&path, &serde_json::to_vec_pretty(categories)?)?;
        Ok(true)
    }

    fn remove(&self, domain: &str) -> StorageResult<()> {
        remove_if_present(&self.entry_path(QUEUE_DIR, domain)?)
    }
}

impl CheckpointStore for FsStorage {
    fn load(&self, domain: &str) -> StorageResult<Option<Checkpoint>> {
        let path = self.entry_path(CHECKPOINTS_DIR, domain)?;
        match read_optional(&path)? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    fn commit(&self, domain: &str, checkpoint: &Checkpoint) -> StorageResult<()> {
        let checkpoint_path = self.entry_path(CHECKPOINTS_DIR, domain)?;
        let results_path = self.entry_path(RESULTS_DIR, domain)?;

        write_atomic(&checkpoint_path, &serde_json::to_vec_pretty(checkpoint)?)?;
        write_atomic(&results_path, &serde_json::to_vec_pretty(&checkpoint.links)?)?;

        tracing::trace!(
            "Committed checkpoint for {} ({} categories, {} links)",
            domain,
            checkpoint.processed_categories,
            checkpoint.links.len()
        );
        Ok(())
    }

    fn discard(&self, domain: &str) -> StorageResult<()> {
        remove_if_present(&self.entry_path(CHECKPOINTS_DIR, domain)?)
    }
}

impl StrategyCache for FsStorage {
    fn get(&self, domain: &str) -> StorageResult<Option<bool>> {
        let path = self.entry_path(STRATEGY_DIR, domain)?;
        match read_optional(&path)? {
            Some(content) => {
                let entry: StrategyEntry = serde_json::from_str(&content)?;
                Ok(Some(entry.value))
            }
            None => Ok(None),
        }
    }

    fn get_or_insert(&self, domain: &str, primary_effective: bool) -> StorageResult<bool> {
        let path = self.entry_path(STRATEGY_DIR, domain)?;
        let body = serde_json::to_vec(&StrategyEntry {
            value: primary_effective,
        })?;

        if write_new(&path, &body)? {
            return Ok(primary_effective);
        }
        self.get(domain)?
            .ok_or_else(|| StorageError::NotFound(domain.to_string()))
    }
}

impl ResultStore for FsStorage {
    fn read_results(&self, domain: &str) -> StorageResult<Vec<String>> {
        let path = self.entry_path(RESULTS_DIR, domain)?;
        let content =
            read_optional(&path)?.ok_or_else(|| StorageError::NotFound(domain.to_string()))?;
        parse_link_array(&content)
    }

    fn result_domains(&self) -> StorageResult<Vec<String>> {
        self.list_dir(RESULTS_DIR)
    }
}
