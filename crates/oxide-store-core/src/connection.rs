//! The connection seam.
//!
//! Drivers implement these traits; everything above them is dialect-aware but
//! driver-agnostic. All calls block until the engine answers.

use std::sync::Arc;

use crate::error::Result;
use crate::row::Rows;
use crate::value::SqlValue;

/// Outcome of a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Row id generated by this statement's insert, when the engine reports one.
    pub last_inserted: Option<i64>,
    /// Number of rows this statement changed. Zero for DDL.
    pub affected_rows: u64,
}

/// A database connection.
pub trait Connection: Send + Sync {
    /// Executes exactly one statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns the normalized driver error.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult>;

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns the normalized driver error.
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Rows>>;

    /// Compiles `sql` into a reusable prepared statement.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the engine rejects the statement.
    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement>>;

    /// Opens a native transaction.
    ///
    /// Each call opens an independent transaction. Calls made directly on
    /// the connection while it is open must not run inside it.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the transaction cannot be started.
    fn begin(&self) -> Result<Box<dyn NativeTx>>;
}

/// A compiled statement bound to the connection that prepared it.
pub trait PreparedStatement: Send + Sync {
    /// Returns the SQL this statement was compiled from.
    fn sql(&self) -> &str;

    /// Executes the statement.
    ///
    /// # Errors
    ///
    /// Returns the normalized driver error.
    fn execute(&self, params: &[SqlValue]) -> Result<ExecResult>;

    /// Runs the statement as a query.
    ///
    /// # Errors
    ///
    /// Returns the normalized driver error.
    fn query(&self, params: &[SqlValue]) -> Result<Box<dyn Rows>>;
}

/// A transaction opened on one connection.
///
/// Dropping an uncompleted transaction must roll it back.
pub trait NativeTx: Send {
    /// Executes a statement inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns the normalized driver error.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<ExecResult>;

    /// Runs a query inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns the normalized driver error.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Rows>>;

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error; the transaction is finished either way.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns the driver error; the transaction is finished either way.
    fn rollback(self: Box<Self>) -> Result<()>;
}

/// Returns `true` if both handles point at the same connection object.
#[must_use]
pub fn same_connection(a: &Arc<dyn Connection>, b: &Arc<dyn Connection>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}
