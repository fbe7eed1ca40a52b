//! Transactions.
//!
//! A [`Tx`] wraps one native transaction and the [`Store`] whose statements
//! and scanners it uses. [`UnitOfWork`] carries the ambient transaction of a
//! logical operation across stores.

mod unit;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::connection::{ExecResult, NativeTx};
use crate::cursor::Cursor;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::value::SqlValue;

pub use unit::UnitOfWork;

struct Shared {
    native: Mutex<Option<Box<dyn NativeTx>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let native = self
            .native
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(native) = native {
            warn!("Transaction dropped without commit or rollback, rolling back");
            if let Err(err) = native.rollback() {
                warn!(error = %err, "Rollback of dropped transaction failed");
            }
        }
    }
}

/// A native transaction bound to a store.
///
/// Clones share the native transaction. Committing or rolling back through
/// any clone finishes it for all of them; later calls return
/// [`Error::TransactionNotFound`]. A transaction finished by neither is
/// rolled back when the last clone is dropped.
#[derive(Clone)]
pub struct Tx {
    store: Store,
    shared: Arc<Shared>,
}

impl Tx {
    pub(crate) fn new(store: Store, native: Box<dyn NativeTx>) -> Self {
        Self {
            store,
            shared: Arc::new(Shared {
                native: Mutex::new(Some(native)),
            }),
        }
    }

    /// Returns the same native transaction driven through `store`'s
    /// statements. `store` must share this transaction's connection.
    pub(crate) fn with_store(&self, store: &Store) -> Self {
        Self {
            store: store.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    fn native(&self) -> MutexGuard<'_, Option<Box<dyn NativeTx>>> {
        self.shared
            .native
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn with_native<R>(&self, f: impl FnOnce(&mut dyn NativeTx) -> Result<R>) -> Result<R> {
        let mut guard = self.native();
        let native = guard.as_mut().ok_or(Error::TransactionNotFound)?;
        f(native.as_mut())
    }

    /// Returns the store this transaction resolves statements against.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns the store's dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.store.dialect()
    }

    /// Returns `true` until the transaction is committed or rolled back.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.native().is_some()
    }

    /// Returns `true` if both handles drive the same native transaction.
    #[must_use]
    pub fn shares_transaction(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Executes the named statement inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`], [`Error::StatementNotFound`],
    /// [`Error::TransactionNotFound`] or the driver error.
    pub fn exec(&self, name: &str, params: &[SqlValue]) -> Result<ExecResult> {
        let sql = self.store.statement_sql(name)?;
        debug!(statement = %name, "Executing statement in transaction");
        self.with_native(|tx| tx.execute(&sql, params))
    }

    /// Runs the named statement as a query inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`], [`Error::StatementNotFound`], a scanner
    /// lookup error, [`Error::TransactionNotFound`] or the driver error.
    pub fn query<T: 'static>(
        &self,
        name: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        let sql = self.store.statement_sql(name)?;
        let scanner = self.store.scanner::<T>(scanner)?;
        debug!(statement = %name, "Querying statement in transaction");
        let rows = self.with_native(|tx| tx.query(&sql, params))?;
        Ok(Cursor::new(rows, scanner))
    }

    /// Runs the named statement and scans its first row.
    ///
    /// # Errors
    ///
    /// Same as [`Tx::query`], plus [`Error::EntryNotFound`].
    pub fn query_first<T: 'static>(
        &self,
        name: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<T> {
        self.query(name, scanner, params)?.first()
    }

    /// Executes ad-hoc SQL inside the transaction after variable substitution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] or the driver error.
    pub fn raw_exec(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        let sql = self.store.resolve(sql);
        debug!(sql = %sql, "Executing SQL in transaction");
        self.with_native(|tx| tx.execute(&sql, params))
    }

    /// Runs an ad-hoc query inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns a scanner lookup error, [`Error::TransactionNotFound`] or the
    /// driver error.
    pub fn raw_query<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        let scanner = self.store.scanner::<T>(scanner)?;
        let sql = self.store.resolve(sql);
        debug!(sql = %sql, "Querying SQL in transaction");
        let rows = self.with_native(|tx| tx.query(&sql, params))?;
        Ok(Cursor::new(rows, scanner))
    }

    /// Runs an ad-hoc query and scans its first row.
    ///
    /// # Errors
    ///
    /// Same as [`Tx::raw_query`], plus [`Error::EntryNotFound`].
    pub fn raw_query_first<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<T> {
        self.raw_query(sql, scanner, params)?.first()
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] if it is already finished, or
    /// the driver error.
    pub fn commit(&self) -> Result<()> {
        let native = self.native().take().ok_or(Error::TransactionNotFound)?;
        debug!(dialect = %self.dialect(), "Committing transaction");
        native.commit()
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionNotFound`] if it is already finished, or
    /// the driver error.
    pub fn rollback(&self) -> Result<()> {
        let native = self.native().take().ok_or(Error::TransactionNotFound)?;
        debug!(dialect = %self.dialect(), "Rolling back transaction");
        native.rollback()
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("dialect", &self.dialect())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
