//! Database schema definitions
//!
//! This module contains the SQL schema for the embedded storage backend.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Pending site jobs; categories is a JSON array, '[]' until discovery runs
CREATE TABLE IF NOT EXISTS jobs (
    domain TEXT PRIMARY KEY,
    categories TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

-- Per-site crawl progress
CREATE TABLE IF NOT EXISTS checkpoints (
    domain TEXT PRIMARY KEY,
    processed_categories INTEGER NOT NULL,
    links TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Product links per site, rewritten with every checkpoint
CREATE TABLE IF NOT EXISTS results (
    domain TEXT PRIMARY KEY,
    links TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Write-once extraction strategy decision per site
CREATE TABLE IF NOT EXISTS strategy_cache (
    domain TEXT PRIMARY KEY,
    primary_effective INTEGER NOT NULL,
    decided_at TEXT NOT NULL
);
"#;

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: u32 = 1;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Reads the schema version recorded in the database
pub fn get_schema_version(conn: &rusqlite::Connection) -> Result<u32, rusqlite::Error> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}
