//! The "current executor" capability.
//!
//! Collection code is written once against [`Executor`] and called with
//! either a [`Store`] (autocommit) or a [`Tx`].

use crate::connection::ExecResult;
use crate::cursor::Cursor;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::store::Store;
use crate::tx::Tx;
use crate::value::SqlValue;

/// Runs named statements and ad-hoc SQL.
pub trait Executor {
    /// Returns the dialect statements are written for.
    fn dialect(&self) -> Dialect;

    /// Executes the named statement.
    ///
    /// # Errors
    ///
    /// See [`Store::exec`].
    fn exec(&self, name: &str, params: &[SqlValue]) -> Result<ExecResult>;

    /// Runs the named statement as a query.
    ///
    /// # Errors
    ///
    /// See [`Store::query`].
    fn query<T: 'static>(&self, name: &str, scanner: &str, params: &[SqlValue])
        -> Result<Cursor<T>>;

    /// Executes ad-hoc SQL after variable substitution.
    ///
    /// # Errors
    ///
    /// See [`Store::raw_exec`].
    fn raw_exec(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult>;

    /// Runs an ad-hoc query after variable substitution.
    ///
    /// # Errors
    ///
    /// See [`Store::raw_query`].
    fn raw_query<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>>;

    /// Runs the named statement and scans its first row.
    ///
    /// # Errors
    ///
    /// See [`Store::query_first`].
    fn query_first<T: 'static>(&self, name: &str, scanner: &str, params: &[SqlValue]) -> Result<T> {
        self.query(name, scanner, params)?.first()
    }

    /// Runs an ad-hoc query and scans its first row.
    ///
    /// # Errors
    ///
    /// See [`Store::raw_query_first`].
    fn raw_query_first<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<T> {
        self.raw_query(sql, scanner, params)?.first()
    }
}

impl Executor for Store {
    fn dialect(&self) -> Dialect {
        Self::dialect(self)
    }

    fn exec(&self, name: &str, params: &[SqlValue]) -> Result<ExecResult> {
        Self::exec(self, name, params)
    }

    fn query<T: 'static>(
        &self,
        name: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        Self::query(self, name, scanner, params)
    }

    fn raw_exec(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        Self::raw_exec(self, sql, params)
    }

    fn raw_query<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        Self::raw_query(self, sql, scanner, params)
    }
}

impl Executor for Tx {
    fn dialect(&self) -> Dialect {
        Self::dialect(self)
    }

    fn exec(&self, name: &str, params: &[SqlValue]) -> Result<ExecResult> {
        Self::exec(self, name, params)
    }

    fn query<T: 'static>(
        &self,
        name: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        Self::query(self, name, scanner, params)
    }

    fn raw_exec(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        Self::raw_exec(self, sql, params)
    }

    fn raw_query<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        Self::raw_query(self, sql, scanner, params)
    }
}
