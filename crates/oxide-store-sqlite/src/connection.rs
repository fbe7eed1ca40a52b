//! The rusqlite-backed [`Connection`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::params_from_iter;
use tracing::{debug, info, warn};

use oxide_store_core::{
    Connection, Error, ExecResult, NativeTx, PreparedStatement, Result, Row, Rows, SqlValue,
    VecRows,
};

use crate::error::into_store_error;
use crate::value::{from_value_ref, to_rusqlite};

/// How long a statement waits for another connection's lock before
/// failing with [`Error::Busy`].
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle transaction connections kept open per database.
const MAX_IDLE: usize = 4;

static MEMORY_DATABASES: AtomicU64 = AtomicU64::new(0);

type Shared = Arc<Mutex<rusqlite::Connection>>;

#[derive(Debug)]
enum Source {
    File(PathBuf),
    /// URI of a named shared-cache in-memory database.
    Memory(String),
}

impl Source {
    fn open(&self) -> Result<rusqlite::Connection> {
        let conn = match self {
            Self::File(path) => rusqlite::Connection::open(path),
            Self::Memory(uri) => rusqlite::Connection::open(uri),
        }
        .map_err(into_store_error)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(into_store_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(into_store_error)?;
        Ok(conn)
    }
}

/// Connections handed to transactions, one per open transaction.
#[derive(Debug)]
struct Pool {
    source: Source,
    idle: Mutex<Vec<rusqlite::Connection>>,
}

impl Pool {
    fn take(&self) -> Result<rusqlite::Connection> {
        let idle = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match idle {
            Some(conn) => Ok(conn),
            None => {
                debug!(source = ?self.source, "Opening transaction connection");
                self.source.open()
            }
        }
    }

    fn give_back(&self, conn: rusqlite::Connection) {
        if !conn.is_autocommit() {
            warn!("Discarding connection left inside a transaction");
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE {
            idle.push(conn);
        }
    }
}

/// A SQLite database handle.
///
/// Autocommit calls run on one connection behind a mutex, so a handle can be
/// shared by several stores. Share it through one `Arc<dyn Connection>` so
/// those stores are recognized as using the same connection.
///
/// Every transaction runs on a connection of its own, opened against the
/// same database and returned to a small idle pool when it finishes.
/// Autocommit reads never see a transaction's uncommitted rows. An autocommit
/// write waits up to five seconds for an open transaction's write lock, then
/// fails with [`Error::Busy`].
pub struct SqliteConnection {
    autocommit: Shared,
    pool: Arc<Pool>,
}

impl SqliteConnection {
    /// Opens (or creates) the database file at `path` in WAL mode.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening SQLite database");
        let source = Source::File(path.to_path_buf());
        let conn = source.open()?;
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(into_store_error)?;
        debug!(journal_mode = %mode, "Journal mode set");
        Ok(Self::new(conn, source))
    }

    /// Opens a private in-memory database.
    ///
    /// The database lives until the handle and every transaction opened
    /// from it are dropped. Its connections share one cache with table
    /// locks, so an autocommit read of a table an open transaction wrote
    /// fails with [`Error::Busy`] instead of waiting.
    ///
    /// # Errors
    ///
    /// Returns the driver error when SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let id = MEMORY_DATABASES.fetch_add(1, Ordering::Relaxed);
        let uri = format!(
            "file:oxide-store-{}-{id}?mode=memory&cache=shared",
            std::process::id()
        );
        let source = Source::Memory(uri);
        let conn = source.open()?;
        Ok(Self::new(conn, source))
    }

    fn new(conn: rusqlite::Connection, source: Source) -> Self {
        Self {
            autocommit: Arc::new(Mutex::new(conn)),
            pool: Arc::new(Pool {
                source,
                idle: Mutex::new(Vec::new()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        lock(&self.autocommit)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("source", &self.pool.source)
            .finish_non_exhaustive()
    }
}

impl Connection for SqliteConnection {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        execute(&self.lock(), sql, params)
    }

    /// Results are read to the end before this returns. The returned rows
    /// hold no statement or lock, and their memory grows with the result,
    /// so page large reads with `limit`/`offset`.
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Rows>> {
        query(&self.lock(), sql, params)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement>> {
        // Compiling once validates the statement and seeds the cache.
        self.lock()
            .prepare_cached(sql)
            .map(drop)
            .map_err(into_store_error)?;
        Ok(Box::new(SqlitePrepared {
            conn: Arc::clone(&self.autocommit),
            sql: sql.to_string(),
        }))
    }

    fn begin(&self) -> Result<Box<dyn NativeTx>> {
        let conn = self.pool.take()?;
        debug!("Beginning SQLite transaction");
        if let Err(err) = conn.execute_batch("BEGIN") {
            self.pool.give_back(conn);
            return Err(into_store_error(err));
        }
        Ok(Box::new(SqliteTx {
            conn: Some(conn),
            pool: Arc::clone(&self.pool),
        }))
    }
}

struct SqlitePrepared {
    conn: Shared,
    sql: String,
}

impl PreparedStatement for SqlitePrepared {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn execute(&self, params: &[SqlValue]) -> Result<ExecResult> {
        execute(&lock(&self.conn), &self.sql, params)
    }

    fn query(&self, params: &[SqlValue]) -> Result<Box<dyn Rows>> {
        query(&lock(&self.conn), &self.sql, params)
    }
}

struct SqliteTx {
    /// `None` once committed or rolled back.
    conn: Option<rusqlite::Connection>,
    pool: Arc<Pool>,
}

impl SqliteTx {
    fn conn(&self) -> Result<&rusqlite::Connection> {
        self.conn
            .as_ref()
            .ok_or(Error::TransactionNotFound)
    }

    fn finish(mut self: Box<Self>, sql: &str) -> Result<()> {
        let conn = self
            .conn
            .take()
            .ok_or(Error::TransactionNotFound)?;
        let result = conn.execute_batch(sql).map_err(into_store_error);
        if result.is_err() && !conn.is_autocommit() {
            if let Err(err) = conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "Rollback after failed {sql} failed");
            }
        }
        self.pool.give_back(conn);
        result
    }
}

impl NativeTx for SqliteTx {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        execute(self.conn()?, sql, params)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Rows>> {
        query(self.conn()?, sql, params)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        debug!("Committing SQLite transaction");
        self.finish("COMMIT")
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        debug!("Rolling back SQLite transaction");
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if !conn.is_autocommit() {
            if let Err(err) = conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "Failed to roll back abandoned SQLite transaction");
            }
        }
        self.pool.give_back(conn);
    }
}

fn lock(conn: &Shared) -> MutexGuard<'_, rusqlite::Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn count<N: TryInto<u64>>(n: N) -> u64 {
    n.try_into().unwrap_or(u64::MAX)
}

fn total_changes(conn: &rusqlite::Connection) -> Result<i64> {
    conn.prepare_cached("select total_changes()")
        .and_then(|mut stmt| stmt.query_row([], |row| row.get(0)))
        .map_err(into_store_error)
}

/// Runs exactly one statement. Stacked statements are rejected before any
/// of them runs.
///
/// `affected_rows` is zero unless the statement itself changed rows, and
/// `last_inserted` is set only when it moved the connection's last insert
/// rowid.
fn execute(conn: &rusqlite::Connection, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
    debug!(sql = %sql, "Executing SQL");
    let changes_before = total_changes(conn)?;
    let rowid_before = conn.last_insert_rowid();

    let changed = conn
        .execute(sql, params_from_iter(params.iter().map(to_rusqlite)))
        .map_err(into_store_error)?;

    let affected_rows = if total_changes(conn)? == changes_before {
        0
    } else {
        count(changed)
    };
    let rowid = conn.last_insert_rowid();
    Ok(ExecResult {
        last_inserted: (rowid != rowid_before).then_some(rowid),
        affected_rows,
    })
}

fn query(conn: &rusqlite::Connection, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Rows>> {
    debug!(sql = %sql, "Running query");
    let mut stmt = conn.prepare_cached(sql).map_err(into_store_error)?;
    let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt
        .query(params_from_iter(params.iter().map(to_rusqlite)))
        .map_err(into_store_error)?;

    let mut collected = Vec::new();
    while let Some(row) = rows.next().map_err(into_store_error)? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(from_value_ref(row.get_ref(index).map_err(into_store_error)?));
        }
        collected.push(Row::new(Arc::clone(&columns), values));
    }
    Ok(Box::new(VecRows::new(collected)))
}
