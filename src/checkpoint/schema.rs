//! Database schema definitions for per-domain checkpoint files

/// SQL schema for a checkpoint database
pub const SCHEMA_SQL: &str = r#"
-- Discovered product URLs (the resumable snapshot)
CREATE TABLE IF NOT EXISTS products (
    url TEXT PRIMARY KEY
);

-- Snapshot metadata
CREATE TABLE IF NOT EXISTS checkpoint_meta (
    domain TEXT PRIMARY KEY,
    product_count INTEGER NOT NULL,
    saved_at TEXT NOT NULL,
    schema_version INTEGER NOT NULL
);

-- Track crawl runs for this domain
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    fetch_errors INTEGER NOT NULL DEFAULT 0,
    products_found INTEGER NOT NULL DEFAULT 0,
    failure TEXT
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
