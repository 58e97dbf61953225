//! SQLite checkpoint implementation
//!
//! Each domain gets its own database file, so domains never contend for a
//! connection or a lock. Connections are opened per call and dropped
//! straight after, which keeps the store `Send + Sync` without a mutex.

use crate::checkpoint::schema::{get_schema_version, initialize_schema};
use crate::checkpoint::traits::{CheckpointError, CheckpointResult, CheckpointStore, RunCounters};
use crate::checkpoint::RunRecord;
use crate::state::{CrawlState, ProductSet};
use crate::url::file_stem_for;
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite checkpoint backend
#[derive(Debug, Clone)]
pub struct SqliteCheckpointStore {
    dir: PathBuf,
}

impl SqliteCheckpointStore {
    /// Creates a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> CheckpointResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Location of a domain's checkpoint database
    pub fn path_for(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{}.db", file_stem_for(domain)))
    }

    /// Opens (creating if needed) a domain database for writing
    fn open(&self, domain: &str) -> CheckpointResult<Connection> {
        let conn = Connection::open(self.path_for(domain))?;

        // Rollback journal keeps each transaction atomic within a single file
        conn.execute_batch(
            "
            PRAGMA journal_mode = DELETE;
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(conn)
    }

    /// Opens an existing database without creating it
    ///
    /// Read-write so that a hot journal left by an interrupted save is rolled
    /// back before the first read.
    fn open_existing(path: &Path) -> CheckpointResult<Connection> {
        Ok(Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    fn read_products(path: &Path) -> CheckpointResult<ProductSet> {
        let conn = Self::open_existing(path)?;
        let mut stmt = conn.prepare("SELECT url FROM products")?;
        let products = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<ProductSet, _>>()?;
        Ok(products)
    }

    /// Moves an unreadable checkpoint and its journal aside so later saves
    /// start clean
    fn quarantine(path: &Path) -> std::io::Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let mut target = path.as_os_str().to_owned();
        target.push(format!(".corrupt-{}", stamp));
        let target = PathBuf::from(target);
        std::fs::rename(path, &target)?;

        let journal = journal_path(path);
        if journal.exists() {
            std::fs::rename(&journal, journal_path(&target))?;
        }
        Ok(target)
    }

    fn read_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: CrawlState::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(CrawlState::Failed),
            pages_fetched: row.get::<_, i64>(5)? as u64,
            fetch_errors: row.get::<_, i64>(6)? as u64,
            products_found: row.get::<_, i64>(7)? as u64,
            failure: row.get(8)?,
        })
    }
}

/// Rollback journal that SQLite keeps next to `db` during a write
fn journal_path(db: &Path) -> PathBuf {
    let mut journal = db.as_os_str().to_owned();
    journal.push("-journal");
    PathBuf::from(journal)
}

impl CheckpointStore for SqliteCheckpointStore {
    // ===== Product Snapshot =====

    fn load(&self, domain: &str) -> ProductSet {
        let path = self.path_for(domain);
        if !path.exists() {
            tracing::debug!("No checkpoint for {} at {}", domain, path.display());
            return ProductSet::new();
        }

        match Self::read_products(&path) {
            Ok(products) => {
                tracing::info!(
                    "Loaded checkpoint for {}: {} product URLs",
                    domain,
                    products.len()
                );
                products
            }
            Err(e) => {
                let err = CheckpointError::Corrupt {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                };
                match Self::quarantine(&path) {
                    Ok(moved) => tracing::warn!(
                        "{}; starting empty (moved to {})",
                        err,
                        moved.display()
                    ),
                    Err(io) => tracing::warn!(
                        "{}; starting empty (could not move it aside: {})",
                        err,
                        io
                    ),
                }
                ProductSet::new()
            }
        }
    }

    fn save(&self, domain: &str, products: &ProductSet) -> CheckpointResult<()> {
        let mut conn = self.open(domain)?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM products", [])?;
        {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO products (url) VALUES (?1)")?;
            for url in products {
                stmt.execute(params![url])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO checkpoint_meta (domain, product_count, saved_at, schema_version)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                domain,
                products.len() as i64,
                Utc::now().to_rfc3339(),
                get_schema_version()
            ],
        )?;

        tx.commit()?;
        tracing::debug!("Saved checkpoint for {}: {} products", domain, products.len());
        Ok(())
    }

    fn clear(&self, domain: &str) -> CheckpointResult<()> {
        let path = self.path_for(domain);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let journal = journal_path(&path);
        if journal.exists() {
            std::fs::remove_file(&journal)?;
        }
        Ok(())
    }

    // ===== Run Ledger =====

    fn begin_run(&self, domain: &str, config_hash: &str) -> CheckpointResult<i64> {
        let conn = self.open(domain)?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                Utc::now().to_rfc3339(),
                config_hash,
                CrawlState::Running.to_db_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(
        &self,
        domain: &str,
        run_id: i64,
        status: CrawlState,
        counters: RunCounters,
        failure: Option<&str>,
    ) -> CheckpointResult<()> {
        let conn = self.open(domain)?;
        let updated = conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2, pages_fetched = ?3,
             fetch_errors = ?4, products_found = ?5, failure = ?6 WHERE id = ?7",
            params![
                Utc::now().to_rfc3339(),
                status.to_db_string(),
                counters.pages_fetched as i64,
                counters.fetch_errors as i64,
                counters.products_found as i64,
                failure,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(CheckpointError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self, domain: &str) -> CheckpointResult<Option<RunRecord>> {
        let path = self.path_for(domain);
        if !path.exists() {
            return Ok(None);
        }

        let conn = Self::open_existing(&path)?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status,
                 pages_fetched, fetch_errors, products_found, failure
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::read_run,
            )
            .optional()?;
        Ok(run)
    }
}
