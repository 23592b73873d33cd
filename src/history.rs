/*!
 * Sync run history ledger.
 *
 * Persists one row per sync run in a local SQLite database so past runs can
 * be inspected with the `history` subcommand. Recording history is best
 * effort, a failure here must never fail the sync itself.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, params};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// File the history database lives in by default
const DEFAULT_DB_FILENAME: &str = "history.db";

/// Subdirectory of the user data directory that holds it
const DEFAULT_DB_DIRNAME: &str = "locsync";

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Outcome of a recorded sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Changes were detected, translated and written out
    Synced,
    /// No changes were detected, nothing was written
    UpToDate,
    /// The run aborted before writing anything
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Synced => write!(f, "synced"),
            RunStatus::UpToDate => write!(f, "up-to-date"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synced" => Ok(RunStatus::Synced),
            "up-to-date" => Ok(RunStatus::UpToDate),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid run status: {}", s)),
        }
    }
}

/// One recorded sync run
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Unique run identifier
    pub id: String,
    /// When the run started, RFC 3339
    pub started_at: String,
    /// When the run finished, RFC 3339
    pub finished_at: String,
    /// Outcome of the run
    pub status: RunStatus,
    /// Number of source documents scanned
    pub source_documents: i64,
    /// Keys added since the previous run
    pub new_keys: i64,
    /// Keys whose values changed since the previous run
    pub modified_keys: i64,
    /// Keys removed since the previous run
    pub deleted_keys: i64,
    /// Target languages, comma separated
    pub languages: String,
    /// Provider that served the run
    pub provider: String,
    /// Model that served the run
    pub model: String,
    /// Digest of the source tree at the end of the run
    pub tree_digest: String,
}

impl RunRecord {
    /// Generate a fresh run identifier
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// One-line summary for CLI output
    pub fn describe(&self) -> String {
        format!(
            "{}  {:<10}  +{} ~{} -{}  [{}]  {} docs  {} / {}",
            self.started_at,
            self.status.to_string(),
            self.new_keys,
            self.modified_keys,
            self.deleted_keys,
            self.languages,
            self.source_documents,
            self.provider,
            self.model,
        )
    }
}

/// History store backed by SQLite with thread-safe access
#[derive(Clone)]
pub struct HistoryStore {
    /// Where the database file lives, ":memory:" for tests
    db_path: PathBuf,
    /// Shared connection, one writer at a time
    connection: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    /// Open the history store at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open the history store at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // The parent directory may not exist on a first run
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create history directory: {:?}", parent))?;
        }

        info!("Opening history database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open history database: {:?}", db_path))?;

        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory history store (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory history database");

        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;

        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default history database path under the user data directory
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("No usable data directory found"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a closure against the locked connection
    fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("History database lock poisoned: {}", e))?;

        f(&conn)
    }

    /// Run a closure against the connection on the blocking pool
    async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("History database lock poisoned: {}", e))?;

            f(&conn)
        })
        .await
        .context("History task panicked")?
    }

    /// Record a completed run
    pub async fn record_run(&self, record: RunRecord) -> Result<()> {
        self.execute_async(move |conn| {
            conn.execute(
                r#"
                INSERT INTO sync_runs (id, started_at, finished_at, status, source_documents,
                                       new_keys, modified_keys, deleted_keys, languages,
                                       provider, model, tree_digest)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    record.id,
                    record.started_at,
                    record.finished_at,
                    record.status.to_string(),
                    record.source_documents,
                    record.new_keys,
                    record.modified_keys,
                    record.deleted_keys,
                    record.languages,
                    record.provider,
                    record.model,
                    record.tree_digest,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// List the most recent runs, newest first
    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        self.execute_async(move |conn| {
            // Helper function to parse a run row
            fn parse_run_row(row: &rusqlite::Row) -> rusqlite::Result<RunRecord> {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    status: row
                        .get::<_, String>(3)?
                        .parse()
                        .unwrap_or(RunStatus::Failed),
                    source_documents: row.get(4)?,
                    new_keys: row.get(5)?,
                    modified_keys: row.get(6)?,
                    deleted_keys: row.get(7)?,
                    languages: row.get(8)?,
                    provider: row.get(9)?,
                    model: row.get(10)?,
                    tree_digest: row.get(11)?,
                })
            }

            let mut stmt = conn.prepare(
                r#"
                SELECT id, started_at, finished_at, status, source_documents,
                       new_keys, modified_keys, deleted_keys, languages,
                       provider, model, tree_digest
                FROM sync_runs
                ORDER BY started_at DESC
                LIMIT ?1
                "#,
            )?;

            let runs: Vec<RunRecord> = stmt
                .query_map([limit as i64], parse_run_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(runs)
        })
        .await
    }

    /// Number of recorded runs
    pub async fn run_count(&self) -> Result<i64> {
        self.execute_async(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sync_runs", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
    }
}

/// Initialize the database schema
fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing history schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        debug!("History schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // Enable WAL mode for better concurrency and crash recovery
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sync_runs (
            id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            status TEXT NOT NULL,
            source_documents INTEGER NOT NULL,
            new_keys INTEGER NOT NULL,
            modified_keys INTEGER NOT NULL,
            deleted_keys INTEGER NOT NULL,
            languages TEXT NOT NULL,
            provider TEXT NOT NULL,
            model TEXT NOT NULL,
            tree_digest TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sync_runs_started ON sync_runs(started_at);
        CREATE INDEX IF NOT EXISTS idx_sync_runs_status ON sync_runs(status);
        "#,
    )?;

    Ok(())
}
