//! SQLite `ups` table and batched writes
//!
//! [`UpsStore`] is the seam between the pipeline and the database so batching
//! can be exercised without SQLite. [`SqliteStore`] is tuned for a single
//! writer doing one large bulk load: no journal, no fsync, exclusive lock.

use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::uniref::{CanonicalRecord, ColumnSet};

const CREATE_UPS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS ups (
        hash TEXT PRIMARY KEY,
        length INTEGER NOT NULL,
        uniref100_id TEXT,
        uniref90_id TEXT,
        uniparc_id TEXT,
        uniprotkb_acc TEXT,
        product TEXT
    )
"#;

const INSERT_WITH_UNIREF90: &str = "INSERT INTO ups \
    (hash, length, uniref100_id, uniref90_id, uniparc_id, uniprotkb_acc) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const INSERT_WITH_PRODUCT: &str = "INSERT INTO ups \
    (hash, length, uniref100_id, uniref90_id, uniparc_id, uniprotkb_acc, product) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// Transactional sink for canonical records
pub trait UpsStore {
    fn begin(&mut self) -> Result<(), StoreError>;

    fn insert(&mut self, record: &CanonicalRecord) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;
}

/// `ups` table in a SQLite database file
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, apply bulk-load pragmas and
    /// make sure the `ups` table exists.
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.apply_pragmas(config)?;
        store.init_schema()?;

        info!(path = %path.display(), "Opened UPS database");
        Ok(store)
    }

    /// In-memory database (for testing)
    pub fn open_in_memory(config: &StoreConfig) -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.apply_pragmas(config)?;
        store.init_schema()?;
        Ok(store)
    }

    fn apply_pragmas(&self, config: &StoreConfig) -> Result<(), StoreError> {
        // page_size only takes effect before the first table is created
        self.conn.pragma_update(None, "page_size", config.page_size)?;
        self.conn.pragma_update(None, "cache_size", config.cache_size)?;
        self.conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
        self.conn
            .pragma_update(None, "mmap_size", i64::try_from(config.mmap_size).unwrap_or(i64::MAX))?;
        self.conn.pragma_update(None, "synchronous", "OFF")?;
        let journal_mode: String = self
            .conn
            .pragma_update_and_check(None, "journal_mode", "OFF", |row| row.get(0))?;
        self.conn.pragma_update(None, "threads", config.threads)?;

        debug!(
            page_size = config.page_size,
            cache_size = config.cache_size,
            mmap_size = config.mmap_size,
            threads = config.threads,
            journal_mode = %journal_mode,
            "Applied SQLite bulk-load pragmas"
        );
        Ok(())
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(CREATE_UPS_TABLE, [])?;
        Ok(())
    }

    /// Number of rows in `ups`
    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ups", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl UpsStore for SqliteStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION")?;
        Ok(())
    }

    fn insert(&mut self, record: &CanonicalRecord) -> Result<(), StoreError> {
        match &record.columns {
            ColumnSet::WithCoarserCluster { uniref90_id } => {
                let mut stmt = self.conn.prepare_cached(INSERT_WITH_UNIREF90)?;
                stmt.execute(params![
                    record.hash,
                    record.length,
                    record.uniref100_id,
                    uniref90_id,
                    record.uniparc_id,
                    record.uniprotkb_acc,
                ])?;
            },
            ColumnSet::WithProduct { product } => {
                let mut stmt = self.conn.prepare_cached(INSERT_WITH_PRODUCT)?;
                stmt.execute(params![
                    record.hash,
                    record.length,
                    record.uniref100_id,
                    Option::<&str>::None,
                    record.uniparc_id,
                    record.uniprotkb_acc,
                    product,
                ])?;
            },
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }
}

/// Groups inserts into transactions of `flush_every` records.
///
/// A transaction is opened on the first write after a commit, so a run that
/// writes exactly `flush_every` records commits once, and `flush_every + 1`
/// records commit twice (the second time from [`BatchWriter::finalize`]).
pub struct BatchWriter<S: UpsStore> {
    store: S,
    flush_every: u64,
    pending: u64,
    written: u64,
    commits: u64,
    in_transaction: bool,
}

impl<S: UpsStore> BatchWriter<S> {
    pub fn new(store: S, flush_every: u64) -> Self {
        Self {
            store,
            flush_every: flush_every.max(1),
            pending: 0,
            written: 0,
            commits: 0,
            in_transaction: false,
        }
    }

    pub fn write(&mut self, record: &CanonicalRecord) -> Result<(), StoreError> {
        if !self.in_transaction {
            self.store.begin()?;
            self.in_transaction = true;
        }

        self.store.insert(record)?;
        self.pending += 1;
        self.written += 1;

        if self.pending >= self.flush_every {
            self.commit()?;
        }
        Ok(())
    }

    /// Commit whatever is still pending and hand the store back together
    /// with the total number of commits.
    pub fn finalize(mut self) -> Result<(S, u64), StoreError> {
        if self.in_transaction {
            self.commit()?;
        }
        info!(written = self.written, commits = self.commits, "Finalized UPS writes");
        Ok((self.store, self.commits))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.store.commit()?;
        self.commits += 1;
        debug!(batch = self.pending, written = self.written, "Committed batch");
        self.pending = 0;
        self.in_transaction = false;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }
}
