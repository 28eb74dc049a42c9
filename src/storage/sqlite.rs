//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the store traits.
//! Link lists are stored as JSON text so both backends share one format.

use crate::storage::schema::{get_schema_version, initialize_schema};
use crate::storage::traits::{
    validate_key, CheckpointStore, ResultStore, StorageError, StorageResult, StrategyCache,
    TaskQueue,
};
use crate::storage::{Checkpoint, CrawlJob};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        tracing::debug!(
            "Opened SQLite storage at {} (schema v{})",
            path.display(),
            get_schema_version(&conn)?
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn decode_links(json: &str) -> StorageResult<Vec<String>> {
    Ok(serde_json::from_str(json)?)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl TaskQueue for SqliteStorage {
    fn enqueue(&self, domain: &str, categories: &[String]) -> StorageResult<bool> {
        validate_key(domain)?;
        let categories = serde_json::to_string(categories)?;
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO jobs (domain, categories, created_at) VALUES (?1, ?2, ?3)",
            params![domain, categories, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }

    fn list_pending(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT domain FROM jobs ORDER BY domain")?;
        let domains = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(domains)
    }

    fn read_job(&self, domain: &str) -> StorageResult<CrawlJob> {
        validate_key(domain)?;
        let conn = self.conn()?;
        let categories: Option<String> = conn
            .query_row(
                "SELECT categories FROM jobs WHERE domain = ?1",
                params![domain],
                |row| row.get(0),
            )
            .optional()?;

        let categories = categories.ok_or_else(|| StorageError::NotFound(domain.to_string()))?;
        Ok(CrawlJob {
            domain: domain.to_string(),
            categories: decode_links(&categories)?,
        })
    }

    fn populate(&self, domain: &str, categories: &[String]) -> StorageResult<bool> {
        validate_key(domain)?;
        let categories = serde_json::to_string(categories)?;
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE jobs SET categories = ?2 WHERE domain = ?1 AND categories = '[]'",
            params![domain, categories],
        )?;
        Ok(updated == 1)
    }

    fn remove(&self, domain: &str) -> StorageResult<()> {
        validate_key(domain)?;
        self.conn()?
            .execute("DELETE FROM jobs WHERE domain = ?1", params![domain])?;
        Ok(())
    }
}

impl CheckpointStore for SqliteStorage {
    fn load(&self, domain: &str) -> StorageResult<Option<Checkpoint>> {
        validate_key(domain)?;
        let conn = self.conn()?;
        let row: Option<(i64, String, String)> = conn
            .query_row(
                "SELECT processed_categories, links, updated_at FROM checkpoints WHERE domain = ?1",
                params![domain],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((processed, links, updated_at)) => Ok(Some(Checkpoint {
                processed_categories: processed.max(0) as usize,
                links: decode_links(&links)?,
                updated_at: parse_timestamp(&updated_at),
            })),
            None => Ok(None),
        }
    }

    fn commit(&self, domain: &str, checkpoint: &Checkpoint) -> StorageResult<()> {
        validate_key(domain)?;
        let links = serde_json::to_string(&checkpoint.links)?;
        let updated_at = checkpoint.updated_at.to_rfc3339();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO checkpoints (domain, processed_categories, links, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(domain) DO UPDATE SET
                processed_categories = excluded.processed_categories,
                links = excluded.links,
                updated_at = excluded.updated_at",
            params![domain, checkpoint.processed_categories as i64, links, updated_at],
        )?;
        tx.execute(
            "INSERT INTO results (domain, links, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(domain) DO UPDATE SET
                links = excluded.links,
                updated_at = excluded.updated_at",
            params![domain, links, updated_at],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn discard(&self, domain: &str) -> StorageResult<()> {
        validate_key(domain)?;
        self.conn()?
            .execute("DELETE FROM checkpoints WHERE domain = ?1", params![domain])?;
        Ok(())
    }
}

impl StrategyCache for SqliteStorage {
    fn get(&self, domain: &str) -> StorageResult<Option<bool>> {
        validate_key(domain)?;
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT primary_effective FROM strategy_cache WHERE domain = ?1",
                params![domain],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_or_insert(&self, domain: &str, primary_effective: bool) -> StorageResult<bool> {
        validate_key(domain)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO strategy_cache (domain, primary_effective, decided_at)
             VALUES (?1, ?2, ?3)",
            params![domain, primary_effective, Utc::now().to_rfc3339()],
        )?;
        let stored = conn.query_row(
            "SELECT primary_effective FROM strategy_cache WHERE domain = ?1",
            params![domain],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(stored)
    }
}

impl ResultStore for SqliteStorage {
    fn read_results(&self, domain: &str) -> StorageResult<Vec<String>> {
        validate_key(domain)?;
        let conn = self.conn()?;
        let links: Option<String> = conn
            .query_row(
                "SELECT links FROM results WHERE domain = ?1",
                params![domain],
                |row| row.get(0),
            )
            .optional()?;

        let links = links.ok_or_else(|| StorageError::NotFound(domain.to_string()))?;
        decode_links(&links)
    }

    fn result_domains(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT domain FROM results ORDER BY domain")?;
        let domains = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(domains)
    }
}
